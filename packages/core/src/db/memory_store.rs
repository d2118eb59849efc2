//! In-memory content store
//!
//! Backs development harnesses and tests. Records live in a `HashMap` guarded
//! by a tokio `RwLock`; every completed change is broadcast as a
//! [`ContentEvent`].

use crate::db::{ContentEvent, ContentStore};
use crate::models::{ContentKey, ContentRecord, DocumentNode};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Capacity of the event channel; slow subscribers observe `Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 128;

pub struct InMemoryContentStore {
    records: RwLock<HashMap<ContentKey, ContentRecord>>,
    event_tx: broadcast::Sender<ContentEvent>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to change events emitted after each write or delete
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<ContentEvent> {
        self.event_tx.subscribe()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn emit(&self, event: ContentEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn write_content(
        &self,
        owner_id: &str,
        document: &DocumentNode,
        slug: &str,
    ) -> Result<()> {
        let key = ContentKey::new(owner_id, slug);
        let record = {
            let mut records = self.records.write().await;
            let existing = records.remove(&key);
            let record = ContentRecord::upsert(existing, owner_id, slug, document.clone());
            records.insert(key, record.clone());
            record
        };

        tracing::debug!(
            "Stored content {}/{} ({} chars)",
            owner_id,
            slug,
            record.char_count
        );
        self.emit(ContentEvent::ContentWritten(record));
        Ok(())
    }

    async fn delete_if_empty(&self, owner_id: &str, slug: &str) -> Result<()> {
        let removed = self
            .records
            .write()
            .await
            .remove(&ContentKey::new(owner_id, slug));

        if removed.is_some() {
            tracing::debug!("Deleted content {}/{}", owner_id, slug);
            self.emit(ContentEvent::ContentDeleted {
                owner_id: owner_id.to_string(),
                slug: slug.to_string(),
            });
        } else {
            tracing::debug!("No content stored for {}/{}, delete is a no-op", owner_id, slug);
        }
        Ok(())
    }

    async fn get_content(&self, owner_id: &str, slug: &str) -> Result<Option<ContentRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&ContentKey::new(owner_id, slug))
            .cloned())
    }
}
