//! Persistence Layer
//!
//! This module handles every interaction with the content service editors
//! persist into:
//!
//! - `ContentStore` trait: upsert, delete-if-empty, and load by `(owner_id, slug)`
//! - `InMemoryContentStore`: process-local store for harnesses and tests
//! - `FileContentStore`: one JSON record per document on disk
//! - `ContentEvent`: change notifications broadcast after a store operation
//!
//! The hosted backend behind the application is an external collaborator; any
//! implementation of `ContentStore` can stand in for it.

mod content_store;
mod error;
pub mod events;
mod file_store;
mod memory_store;

pub use content_store::ContentStore;
pub use error::StoreError;
pub use events::ContentEvent;
pub use file_store::FileContentStore;
pub use memory_store::InMemoryContentStore;
