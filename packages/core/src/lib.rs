//! AppsDir Core Editor Persistence Layer
//!
//! This crate provides the document model, content store abstraction, and
//! autosave services behind the AppsDir rich-text editors (app
//! introductions, stories).
//!
//! # Architecture
//!
//! - **Structured documents**: editor JSON trees compared structurally, never by identity
//! - **Store trait**: the hosted content service sits behind `ContentStore`
//! - **Autosave**: debounced writes, blank-content removal, bounded manual retry
//! - **Single writer**: one coordinator task per `(owner_id, slug)` serialises writes
//!
//! # Modules
//!
//! - [`models`] - Documents, records, save status, configuration
//! - [`db`] - `ContentStore` trait, in-memory and file stores, change events
//! - [`services`] - Debouncer, removal guard, autosave session and coordinator, upload policy

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{ContentStore, FileContentStore, InMemoryContentStore};
pub use models::*;
pub use services::{AutosaveCoordinator, AutosaveError, AutosaveHandle, SettleOutcome};
