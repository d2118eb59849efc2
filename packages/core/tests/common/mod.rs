//! Shared helpers for autosave integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use appsdir_core::db::ContentStore;
use appsdir_core::models::{AutosaveSnapshot, ContentRecord, DocumentNode};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::watch;

/// One call observed by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Write {
        owner_id: String,
        slug: String,
        document: DocumentNode,
    },
    Delete {
        owner_id: String,
        slug: String,
    },
}

/// Store double that records every call and fails on demand
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    failing_writes: Mutex<u32>,
    failing_deletes: Mutex<bool>,
    snapshots: Mutex<Option<watch::Receiver<AutosaveSnapshot>>>,
    seen_at_write: Mutex<Vec<AutosaveSnapshot>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` write calls
    pub fn fail_next_writes(&self, n: u32) {
        *self.failing_writes.lock().unwrap() = n;
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.failing_deletes.lock().unwrap() = fail;
    }

    /// Capture the latest snapshot each time a write call arrives
    pub fn observe_snapshots(&self, rx: watch::Receiver<AutosaveSnapshot>) {
        *self.snapshots.lock().unwrap() = Some(rx);
    }

    pub fn snapshots_at_write(&self) -> Vec<AutosaveSnapshot> {
        self.seen_at_write.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<DocumentNode> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Write { document, .. } => Some(document),
                StoreCall::Delete { .. } => None,
            })
            .collect()
    }

    pub fn delete_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Delete { .. }))
            .count()
    }
}

#[async_trait]
impl ContentStore for RecordingStore {
    async fn write_content(
        &self,
        owner_id: &str,
        document: &DocumentNode,
        slug: &str,
    ) -> Result<()> {
        if let Some(rx) = self.snapshots.lock().unwrap().as_ref() {
            self.seen_at_write.lock().unwrap().push(*rx.borrow());
        }
        self.calls.lock().unwrap().push(StoreCall::Write {
            owner_id: owner_id.to_string(),
            slug: slug.to_string(),
            document: document.clone(),
        });

        let mut failing = self.failing_writes.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            bail!("content service unavailable");
        }
        Ok(())
    }

    async fn delete_if_empty(&self, owner_id: &str, slug: &str) -> Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Delete {
            owner_id: owner_id.to_string(),
            slug: slug.to_string(),
        });

        if *self.failing_deletes.lock().unwrap() {
            bail!("content service unavailable");
        }
        Ok(())
    }

    async fn get_content(&self, _owner_id: &str, _slug: &str) -> Result<Option<ContentRecord>> {
        Ok(None)
    }
}

pub fn text_doc(text: &str) -> DocumentNode {
    DocumentNode::doc(vec![DocumentNode::paragraph(vec![DocumentNode::text(text)])])
}

pub const OWNER_ID: &str = "app-1";
pub const SLUG: &str = "my-app";
