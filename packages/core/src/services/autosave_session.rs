//! Autosave Session - save state machine for one editor
//!
//! The session decides what a settled (already debounced) document value turns
//! into: nothing, a write, or a delete. It owns the save status and the retry
//! bookkeeping but no timers; [`AutosaveCoordinator`] feeds it settled values.
//!
//! ## State machine
//!
//! ```text
//! idle ──settle──▶ saving ──▶ saved ──edit──▶ idle
//!                     │
//!                     └──▶ failed ──retry──▶ saving ──▶ {saved, failed}
//! ```
//!
//! - A value structurally equal to the last committed one is skipped.
//! - A blank value (canonical empty or default template) issues one delete and
//!   never a write.
//! - Settling any value while a failed write is pending abandons it: a blank
//!   value is deleted even if already removed once, and a value equal to the
//!   last committed one returns the status to `idle` without a call.
//! - A failed write counts one attempt; `retry` re-issues the same value until
//!   `max_retry_attempts` consecutive failures, after which it is refused.
//! - A new settled value starts a fresh attempt count.
//!
//! Every transition is broadcast as a [`SaveStatus`] and mirrored into a watch
//! channel holding the latest [`AutosaveSnapshot`].
//!
//! [`AutosaveCoordinator`]: crate::services::AutosaveCoordinator

use crate::db::ContentStore;
use crate::models::{
    AutosaveSnapshot, CanonicalDocuments, ContentKey, DocumentNode, RetryState, SaveStatus,
};
use crate::services::{AutosaveError, ContentRemovalGuard};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::instrument;

/// Capacity of the status broadcast
const STATUS_CHANNEL_CAPACITY: usize = 64;

/// What a settled value turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Equal to the last committed value; no external call
    Unchanged,
    /// Written through the content store
    Written,
    /// Blank value; stored content removed
    Removed,
    /// Blank value; delete failed and was logged
    RemovalFailed,
}

pub struct AutosaveSession {
    key: ContentKey,
    store: Arc<dyn ContentStore>,
    guard: ContentRemovalGuard,
    status: SaveStatus,
    retry: RetryState,
    /// Last value known to match storage (written, removed, or loaded)
    last_committed: Option<DocumentNode>,
    /// Value of the most recent failed write, re-issued by `retry`
    failed_value: Option<DocumentNode>,
    status_tx: broadcast::Sender<SaveStatus>,
    snapshot_tx: watch::Sender<AutosaveSnapshot>,
}

impl AutosaveSession {
    pub fn new(
        key: ContentKey,
        store: Arc<dyn ContentStore>,
        canon: CanonicalDocuments,
        max_retry_attempts: u32,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let (snapshot_tx, _) =
            watch::channel(AutosaveSnapshot::new(max_retry_attempts, 0, false));
        let guard = ContentRemovalGuard::new(key.clone(), store.clone(), canon);

        Self {
            key,
            store,
            guard,
            status: SaveStatus::Idle,
            retry: RetryState::new(max_retry_attempts),
            last_committed: None,
            failed_value: None,
            status_tx,
            snapshot_tx,
        }
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    pub fn last_committed(&self) -> Option<&DocumentNode> {
        self.last_committed.as_ref()
    }

    /// Receive every status transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SaveStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn status_sender(&self) -> broadcast::Sender<SaveStatus> {
        self.status_tx.clone()
    }

    /// Observe the latest snapshot
    pub fn watch(&self) -> watch::Receiver<AutosaveSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Editor opened with `initial`; removes stored content if it is blank
    ///
    /// A failed delete is returned as `DeleteFailure` and leaves the value
    /// uncommitted, so the next blank settle tries again.
    #[instrument(skip(self, initial), fields(key = %self.key))]
    pub async fn mount(&mut self, initial: &DocumentNode) -> Result<(), AutosaveError> {
        self.observe(initial);

        let result = self.guard.check(Some(initial)).await;
        if result.is_ok() {
            self.last_committed = Some(initial.clone());
        }
        result.map(|_| ())
    }

    /// A live edit arrived (before debounce); `saved` falls back to `idle`
    pub fn note_edit(&mut self, doc: &DocumentNode) {
        self.observe(doc);
        if self.status == SaveStatus::Saved {
            self.transition(SaveStatus::Idle);
        }
    }

    /// Persist a settled value
    ///
    /// # Errors
    ///
    /// `TransientWriteFailure` while retries remain, `PermanentWriteFailure`
    /// once the bound is reached. Delete failures are not errors here; they
    /// come back as `SettleOutcome::RemovalFailed`.
    #[instrument(skip(self, doc), fields(key = %self.key))]
    pub async fn settle(&mut self, doc: DocumentNode) -> Result<SettleOutcome, AutosaveError> {
        // Any settled value abandons a pending failed write
        let abandoned = self.failed_value.take().is_some();
        if abandoned {
            tracing::debug!("Abandoning failed write for {}", self.key);
        }
        self.retry.reset();

        let unchanged = self.last_committed.as_ref() == Some(&doc);

        if self.guard.is_blank(&doc) && (abandoned || !unchanged) {
            let removed = self.guard.remove().await;
            let outcome = match removed {
                Ok(()) => {
                    self.last_committed = Some(doc);
                    SettleOutcome::Removed
                }
                Err(_) => SettleOutcome::RemovalFailed,
            };
            if self.status != SaveStatus::Idle {
                self.transition(SaveStatus::Idle);
            } else {
                self.publish();
            }
            return Ok(outcome);
        }

        if unchanged {
            tracing::debug!("Settled value unchanged, skipping write");
            if abandoned {
                // The failed value never reached storage, which still holds this one
                self.transition(SaveStatus::Idle);
            }
            return Ok(SettleOutcome::Unchanged);
        }

        self.write(doc).await.map(|_| SettleOutcome::Written)
    }

    /// Re-issue the last failed write with the same value
    ///
    /// # Errors
    ///
    /// - `NothingToRetry` if no failed write is pending
    /// - `PermanentWriteFailure` if the retry bound is already reached (no
    ///   write is issued) or this attempt reaches it
    /// - `TransientWriteFailure` if this attempt fails with retries remaining
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn retry(&mut self) -> Result<(), AutosaveError> {
        let doc = match (&self.failed_value, self.status) {
            (Some(doc), SaveStatus::Failed) => doc.clone(),
            _ => return Err(AutosaveError::nothing_to_retry(&self.key)),
        };

        if self.retry.exhausted() {
            tracing::warn!(
                "Retry refused for {}: {} attempts already failed",
                self.key,
                self.retry.attempts
            );
            return Err(AutosaveError::permanent_write(
                &self.key,
                self.retry.attempts,
                "retry limit reached",
            ));
        }

        tracing::info!(
            "Retrying write for {} (attempt {} of {})",
            self.key,
            self.retry.attempts + 1,
            self.retry.max_attempts
        );
        self.retry.in_flight = true;
        self.write(doc).await
    }

    async fn write(&mut self, doc: DocumentNode) -> Result<(), AutosaveError> {
        self.transition(SaveStatus::Saving);
        tracing::debug!(
            "Writing {} ({} chars, {} media)",
            self.key,
            doc.character_count(),
            doc.media_sources().len()
        );

        let result = self
            .store
            .write_content(&self.key.owner_id, &doc, &self.key.slug)
            .await;

        match result {
            Ok(()) => {
                self.last_committed = Some(doc);
                self.failed_value = None;
                self.retry.reset();
                self.transition(SaveStatus::Saved);
                Ok(())
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                self.retry.record_failure();
                self.failed_value = Some(doc);
                self.transition(SaveStatus::Failed);

                if self.retry.exhausted() {
                    tracing::error!(
                        "Write for {} failed {} times, giving up: {}",
                        self.key,
                        self.retry.attempts,
                        reason
                    );
                    Err(AutosaveError::permanent_write(
                        &self.key,
                        self.retry.attempts,
                        reason,
                    ))
                } else {
                    tracing::warn!(
                        "Write for {} failed (attempt {} of {}): {}",
                        self.key,
                        self.retry.attempts,
                        self.retry.max_attempts,
                        reason
                    );
                    Err(AutosaveError::transient_write(
                        &self.key,
                        self.retry.attempts,
                        self.retry.max_attempts,
                        reason,
                    ))
                }
            }
        }
    }

    fn observe(&mut self, doc: &DocumentNode) {
        let char_count = doc.character_count();
        let is_empty = self.guard.canon().is_empty(doc);
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.char_count = char_count;
            snapshot.is_empty = is_empty;
        });
    }

    fn transition(&mut self, status: SaveStatus) {
        tracing::debug!("{}: {} -> {}", self.key, self.status, status);
        self.status = status;
        // No subscribers is fine
        let _ = self.status_tx.send(status);
        self.publish();
    }

    fn publish(&self) {
        let status = self.status;
        let retry = self.retry;
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.status = status;
            snapshot.retry = retry;
        });
    }
}
