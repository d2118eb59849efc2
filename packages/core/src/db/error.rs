//! Store Error Types
//!
//! This module defines error types for content store operations: key
//! validation, file I/O, and (de)serialization of persisted records.

use std::path::PathBuf;
use thiserror::Error;

/// Content store errors
///
/// Store trait methods surface these through `anyhow::Result`; the service
/// layer turns them into autosave errors with the message retained.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Owner id or slug cannot be used as a storage key
    #[error("Invalid content key component {component:?}: {reason}")]
    InvalidKey { component: String, reason: String },

    /// Failed to create the store's root directory
    #[error("Failed to create content directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File system operation failed
    #[error("Content store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted record could not be encoded or decoded
    #[error("Content record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an invalid key error
    pub fn invalid_key(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory creation error
    pub fn directory_creation_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed { path, source }
    }
}
