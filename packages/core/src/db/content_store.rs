//! ContentStore Trait - Persistence Abstraction
//!
//! This module defines the `ContentStore` trait that abstracts the hosted
//! content service the editors persist into. Autosave services only talk to
//! this trait, so the in-memory store, the file store, and a remote backend are
//! interchangeable.
//!
//! # Contract
//!
//! - `write_content` is an upsert: calling it repeatedly with the same document
//!   is safe and leaves one record per `(owner_id, slug)`.
//! - `delete_if_empty` removes the record for `(owner_id, slug)` and is a no-op
//!   when nothing is stored. Repeated deletes are not errors.
//! - Errors use `anyhow::Result` for flexible context; callers decide whether a
//!   failure is transient.
//!
//! # Examples
//!
//! ```rust,no_run
//! use appsdir_core::db::{ContentStore, InMemoryContentStore};
//! use appsdir_core::models::DocumentNode;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
//!     let hello = DocumentNode::paragraph(vec![DocumentNode::text("Hello")]);
//!     let doc = DocumentNode::doc(vec![hello]);
//!
//!     store.write_content("app-1", &doc, "my-app").await?;
//!     store.delete_if_empty("app-1", "my-app").await?;
//!     Ok(())
//! }
//! ```

use crate::models::{ContentRecord, DocumentNode};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence operations for editor content
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a coordinator holds the store in an
/// `Arc` and calls it from a spawned task.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upsert `document` as the content of `(owner_id, slug)`
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects or cannot complete the write.
    async fn write_content(&self, owner_id: &str, document: &DocumentNode, slug: &str)
        -> Result<()>;

    /// Remove the content of `(owner_id, slug)` if any is stored
    ///
    /// Succeeds without effect when nothing is stored.
    async fn delete_if_empty(&self, owner_id: &str, slug: &str) -> Result<()>;

    /// Load the stored record for `(owner_id, slug)`
    ///
    /// - `Ok(Some(record))` if content is stored
    /// - `Ok(None)` if nothing is stored (not an error)
    async fn get_content(&self, owner_id: &str, slug: &str) -> Result<Option<ContentRecord>>;
}
