//! File-backed content store
//!
//! Persists one JSON record per document at `<root>/<owner_id>/<slug>.json`.
//! Writes go through a temporary file in the same directory followed by a
//! rename, so readers never observe a half-written record.

use crate::db::{ContentEvent, ContentStore, StoreError};
use crate::models::{ContentRecord, DocumentNode};
use anyhow::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 128;
const RECORD_EXTENSION: &str = "json";

pub struct FileContentStore {
    root: PathBuf,
    /// Serialises read-modify-write cycles so record ids survive concurrent upserts
    write_lock: Mutex<()>,
    event_tx: broadcast::Sender<ContentEvent>,
}

impl FileContentStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::directory_creation_failed(root.clone(), e))?;

        tracing::info!("FileContentStore opened at {}", root.display());

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            event_tx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subscribe_to_events(&self) -> broadcast::Receiver<ContentEvent> {
        self.event_tx.subscribe()
    }

    fn record_path(&self, owner_id: &str, slug: &str) -> Result<PathBuf, StoreError> {
        validate_component(owner_id)?;
        validate_component(slug)?;
        Ok(self
            .root
            .join(owner_id)
            .join(format!("{}.{}", slug, RECORD_EXTENSION)))
    }

    async fn read_record(path: &Path) -> Result<Option<ContentRecord>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `bytes` to `tmp_path`, then move it over `path`; the temp file never
/// outlives a failed rename
async fn replace_file(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    tokio::fs::write(tmp_path, bytes).await?;
    if let Err(e) = tokio::fs::rename(tmp_path, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(tmp_path).await {
            tracing::warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Key components become path segments; reject anything that could escape the root
fn validate_component(component: &str) -> Result<(), StoreError> {
    if component.is_empty() {
        return Err(StoreError::invalid_key(component, "must not be empty"));
    }
    if component == "." || component == ".." || component.contains("..") {
        return Err(StoreError::invalid_key(component, "must not contain '..'"));
    }
    if component.contains(['/', '\\', '\0']) {
        return Err(StoreError::invalid_key(
            component,
            "must not contain path separators",
        ));
    }
    Ok(())
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn write_content(
        &self,
        owner_id: &str,
        document: &DocumentNode,
        slug: &str,
    ) -> Result<()> {
        let path = self.record_path(owner_id, slug)?;
        let dir = self.root.join(owner_id);

        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::directory_creation_failed(dir.clone(), e))?;

        let existing = Self::read_record(&path).await?;
        let record = ContentRecord::upsert(existing, owner_id, slug, document.clone());
        let bytes = serde_json::to_vec_pretty(&record).map_err(StoreError::from)?;

        let tmp_path = dir.join(format!(".{}.{}.tmp", slug, RECORD_EXTENSION));
        replace_file(&tmp_path, &path, &bytes).await?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        let _ = self.event_tx.send(ContentEvent::ContentWritten(record));
        Ok(())
    }

    async fn delete_if_empty(&self, owner_id: &str, slug: &str) -> Result<()> {
        let path = self.record_path(owner_id, slug)?;
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                let _ = self.event_tx.send(ContentEvent::ContentDeleted {
                    owner_id: owner_id.to_string(),
                    slug: slug.to_string(),
                });
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not present, delete is a no-op", path.display());
                Ok(())
            }
            Err(e) => Err(StoreError::from(e).into()),
        }
    }

    async fn get_content(&self, owner_id: &str, slug: &str) -> Result<Option<ContentRecord>> {
        let path = self.record_path(owner_id, slug)?;
        Ok(Self::read_record(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_component() {
        assert!(validate_component("my-app").is_ok());
        assert!(validate_component("").is_err());
        assert!(validate_component("..").is_err());
        assert!(validate_component("a/b").is_err());
        assert!(validate_component("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileContentStore::new(temp_dir.path()).await.unwrap();
        let doc = DocumentNode::doc(vec![]);

        let err = store
            .write_content("../outside", &doc, "slug")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
    }

    #[tokio::test]
    async fn test_record_lands_at_owner_slug_path() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileContentStore::new(temp_dir.path()).await.unwrap();
        let doc = DocumentNode::doc(vec![DocumentNode::paragraph(vec![DocumentNode::text("x")])]);

        store.write_content("app-1", &doc, "my-app").await.unwrap();

        let path = temp_dir.path().join("app-1").join("my-app.json");
        assert!(path.exists());
        assert!(!temp_dir.path().join("app-1").join(".my-app.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let tmp_path = temp_dir.path().join(".my-app.json.tmp");
        // A directory in the way makes the rename fail
        let path = temp_dir.path().join("my-app.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let result = replace_file(&tmp_path, &path, b"{}").await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(!tmp_path.exists());
        assert!(path.is_dir());
    }
}
