//! Service Layer Error Types
//!
//! This module defines error types for autosave and upload operations,
//! separating failures the user can retry from ones they cannot.

use crate::models::ContentKey;
use thiserror::Error;

/// Autosave errors
///
/// None of these is fatal to the application. Write failures are surfaced
/// through `SaveStatus::Failed`; delete failures are logged and the editing
/// flow continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutosaveError {
    /// A write failed and may be retried
    #[error("Write for {key} failed (attempt {attempt} of {max_attempts}): {reason}")]
    TransientWriteFailure {
        key: ContentKey,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },

    /// The retry bound is reached; no further writes are issued for this value
    #[error("Write for {key} failed after {attempts} attempts: {reason}")]
    PermanentWriteFailure {
        key: ContentKey,
        attempts: u32,
        reason: String,
    },

    /// Removing blank content failed; the last stored value remains
    #[error("Delete for {key} failed: {reason}")]
    DeleteFailure { key: ContentKey, reason: String },

    /// Retry requested while no failed write is pending
    #[error("Nothing to retry for {key}")]
    NothingToRetry { key: ContentKey },

    /// The coordinator task has stopped
    #[error("Autosave coordinator for {key} is closed")]
    CoordinatorClosed { key: ContentKey },

    /// Configuration rejected at startup
    #[error("Invalid autosave configuration: {0}")]
    InvalidConfig(String),
}

impl AutosaveError {
    /// Create a transient write failure
    pub fn transient_write(
        key: &ContentKey,
        attempt: u32,
        max_attempts: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self::TransientWriteFailure {
            key: key.clone(),
            attempt,
            max_attempts,
            reason: reason.into(),
        }
    }

    /// Create a permanent write failure
    pub fn permanent_write(key: &ContentKey, attempts: u32, reason: impl Into<String>) -> Self {
        Self::PermanentWriteFailure {
            key: key.clone(),
            attempts,
            reason: reason.into(),
        }
    }

    /// Create a delete failure
    pub fn delete_failure(key: &ContentKey, reason: impl Into<String>) -> Self {
        Self::DeleteFailure {
            key: key.clone(),
            reason: reason.into(),
        }
    }

    pub fn nothing_to_retry(key: &ContentKey) -> Self {
        Self::NothingToRetry { key: key.clone() }
    }

    pub fn coordinator_closed(key: &ContentKey) -> Self {
        Self::CoordinatorClosed { key: key.clone() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the user can still be offered a retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientWriteFailure { .. })
    }
}

/// Upload restriction violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Selection would exceed the per-owner image limit
    #[error("Too many files: {requested} selected but only {allowed} more allowed")]
    TooManyFiles { allowed: usize, requested: usize },

    /// File larger than the size cap
    #[error("File {file_name} is {size} bytes, limit is {max} bytes")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    /// Content type outside the allowed family
    #[error("File {file_name} has unsupported content type {content_type}")]
    UnsupportedContentType {
        file_name: String,
        content_type: String,
    },

    /// Empty name or one containing path separators
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Nothing selected
    #[error("No files selected for upload")]
    NoFiles,
}
