//! Content Removal Guard
//!
//! Keeps blank documents out of storage: whenever a settled value (or the value
//! an editor mounts with) equals the canonical empty document or the default
//! template, the guard issues exactly one delete call for that content.
//! Deleting already-absent content is accepted by the store as a no-op, so the
//! guard never treats a repeated delete as an error.

use crate::db::ContentStore;
use crate::models::{CanonicalDocuments, ContentKey, DocumentNode};
use crate::services::AutosaveError;
use std::sync::Arc;
use tracing::instrument;

pub struct ContentRemovalGuard {
    key: ContentKey,
    store: Arc<dyn ContentStore>,
    canon: CanonicalDocuments,
}

impl ContentRemovalGuard {
    pub fn new(key: ContentKey, store: Arc<dyn ContentStore>, canon: CanonicalDocuments) -> Self {
        Self { key, store, canon }
    }

    pub fn canon(&self) -> &CanonicalDocuments {
        &self.canon
    }

    /// Equal to the canonical empty document or the default template
    pub fn is_blank(&self, doc: &DocumentNode) -> bool {
        self.canon.is_blank(doc)
    }

    /// Delete stored content if `doc` is blank (or absent)
    ///
    /// Returns `Ok(true)` when a delete was issued and accepted, `Ok(false)`
    /// when `doc` has content and nothing was done.
    pub async fn check(&self, doc: Option<&DocumentNode>) -> Result<bool, AutosaveError> {
        match doc {
            Some(doc) if !self.is_blank(doc) => Ok(false),
            _ => self.remove().await.map(|_| true),
        }
    }

    /// Issue one delete call for this content
    ///
    /// Failures are logged here and returned as `DeleteFailure`; callers keep
    /// editing with the last stored value in place.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn remove(&self) -> Result<(), AutosaveError> {
        match self
            .store
            .delete_if_empty(&self.key.owner_id, &self.key.slug)
            .await
        {
            Ok(()) => {
                tracing::info!("Removed blank content {}", self.key);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to remove blank content {}: {:#}", self.key, e);
                Err(AutosaveError::delete_failure(&self.key, format!("{:#}", e)))
            }
        }
    }
}
