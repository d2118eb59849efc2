//! Data Models
//!
//! This module contains the core data structures shared by the store and
//! service layers:
//!
//! - `DocumentNode` - Editor document tree (paragraphs, headings, lists, media)
//! - `EditableContent` / `ContentRecord` - Live and persisted forms of a document
//! - `SaveStatus` / `RetryState` - Autosave feedback state
//! - `AutosaveConfig` - Debounce window and retry bound

mod autosave_config;
mod document;
mod save_status;

pub use autosave_config::{
    AutosaveConfig, DEBOUNCE_ENV_VAR, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RETRY_ATTEMPTS,
    MAX_RETRIES_ENV_VAR,
};
pub use document::{
    CanonicalDocuments, ContentKey, ContentRecord, DocumentNode, EditableContent, Mark, NodeKind,
};
pub use save_status::{AutosaveSnapshot, RetryState, SaveStatus};
