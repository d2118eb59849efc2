//! Screenshot upload restrictions
//!
//! The resumable upload itself runs in the object-storage transport; this
//! module only decides what may be handed to it. A selection is checked as a
//! whole against the per-owner image cap, then each file against the content
//! type and size limits, and every accepted file gets its object name and
//! chunk count.

use crate::services::UploadError;
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Folder under an owner's prefix that holds screenshots
pub const SCREENSHOTS_FOLDER: &str = "screenshots";

/// Limits applied before handing files to the upload transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadPolicy {
    /// Images an owner may hold in total, including already stored ones
    pub max_files: usize,
    pub max_file_size: u64,
    /// Chunk size of the resumable transport
    pub chunk_size: u64,
    /// Content-type prefix accepted (e.g. "image/")
    pub allowed_type_prefix: String,
    /// Files uploaded concurrently
    pub parallel_uploads: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_files: 6,
            max_file_size: 3 * MIB,
            chunk_size: 3 * MIB,
            allowed_type_prefix: "image/".to_string(),
            parallel_uploads: 1,
        }
    }
}

/// A file the user selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

impl UploadCandidate {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size,
        }
    }
}

/// Where the owning upload goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket: String,
    pub owner_id: String,
    pub user_id: String,
    pub slug: String,
    pub folder: String,
}

/// An accepted file with its transport metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPlan {
    pub bucket_name: String,
    pub object_name: String,
    pub content_type: String,
    pub size: u64,
    pub chunks: u64,
}

impl UploadPolicy {
    /// Slots left for an owner already holding `existing` images
    pub fn remaining_slots(&self, existing: usize) -> usize {
        self.max_files.saturating_sub(existing)
    }

    /// Check a selection and plan the accepted uploads
    ///
    /// # Errors
    ///
    /// The first violated restriction; nothing is planned if any file fails.
    pub fn validate(
        &self,
        target: &UploadTarget,
        existing: usize,
        files: &[UploadCandidate],
    ) -> Result<Vec<UploadPlan>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let allowed = self.remaining_slots(existing);
        if files.len() > allowed {
            return Err(UploadError::TooManyFiles {
                allowed,
                requested: files.len(),
            });
        }

        files
            .iter()
            .map(|file| self.plan(target, file))
            .collect()
    }

    fn plan(
        &self,
        target: &UploadTarget,
        file: &UploadCandidate,
    ) -> Result<UploadPlan, UploadError> {
        if file.file_name.is_empty() || file.file_name.contains(['/', '\\']) {
            return Err(UploadError::InvalidFileName(file.file_name.clone()));
        }
        if !file.content_type.starts_with(&self.allowed_type_prefix) {
            return Err(UploadError::UnsupportedContentType {
                file_name: file.file_name.clone(),
                content_type: file.content_type.clone(),
            });
        }
        if file.size > self.max_file_size {
            return Err(UploadError::FileTooLarge {
                file_name: file.file_name.clone(),
                size: file.size,
                max: self.max_file_size,
            });
        }

        Ok(UploadPlan {
            bucket_name: target.bucket.clone(),
            object_name: object_name(target, &file.file_name),
            content_type: file.content_type.clone(),
            size: file.size,
            chunks: self.chunk_count(file.size),
        })
    }

    /// Chunks the transport sends for `size` bytes (at least one)
    pub fn chunk_count(&self, size: u64) -> u64 {
        if self.chunk_size == 0 {
            return 1;
        }
        size.div_ceil(self.chunk_size).max(1)
    }
}

/// `<owner_id>/<user_id>/<folder>/<slug>-<file_name>`
pub fn object_name(target: &UploadTarget, file_name: &str) -> String {
    format!(
        "{}/{}/{}/{}-{}",
        target.owner_id, target.user_id, target.folder, target.slug, file_name
    )
}

/// Authorization header value for the upload endpoint
pub fn bearer_header(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}
