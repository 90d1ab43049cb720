//! Checkpoint slots backed by a local JSON file or by process memory.

use anyhow::Context;
use async_trait::async_trait;
use embedsync_core::{Checkpoint, CheckpointStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A checkpoint kept as pretty-printed JSON at a fixed path.
///
/// Saves go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous checkpoint readable.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read checkpoint {}", self.path.display()));
            }
        };

        let checkpoint = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed checkpoint {}", self.path.display()))?;
        Ok(Some(checkpoint))
    }

    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_string_pretty(checkpoint)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body)
            .await
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(
            "Checkpoint saved at offset {}",
            checkpoint.last_processed_offset
        );
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove checkpoint {}", self.path.display())),
        }
    }
}

/// An in-process slot that also records every save. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    slot: Arc<Mutex<Option<Checkpoint>>>,
    history: Arc<Mutex<Vec<Checkpoint>>>,
}

impl MemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose slot already holds `checkpoint`.
    #[must_use]
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(checkpoint))),
            history: Arc::default(),
        }
    }

    pub async fn snapshot(&self) -> Option<Checkpoint> {
        self.slot.lock().await.clone()
    }

    /// Every checkpoint saved so far, oldest first.
    pub async fn saves(&self) -> Vec<Checkpoint> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        *self.slot.lock().await = Some(checkpoint.clone());
        self.history.lock().await.push(checkpoint.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("state").join("checkpoint.json"));

        assert!(store.load().await.unwrap().is_none());

        let cp = Checkpoint::default().advance(25, 20, vec!["42".to_string()]);
        store.save(&cp).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(cp));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileCheckpointStore::new(path);
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn file_store_reads_camel_case_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(
            &path,
            r#"{"lastProcessedOffset":75,"totalProcessed":60,"failedFids":["3"],"timestamp":"2025-05-01T10:00:00Z"}"#,
        )
        .unwrap();

        let cp = FileCheckpointStore::new(path).load().await.unwrap().unwrap();
        assert_eq!(cp.last_processed_offset, 75);
        assert!(cp.has_failed("3"));
    }

    #[tokio::test]
    async fn memory_store_keeps_history_across_clear() {
        let store = MemoryCheckpointStore::new();
        let first = Checkpoint::default().advance(10, 10, Vec::new());
        let second = first.advance(10, 9, vec!["x".to_string()]);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.snapshot().await.is_none());
        assert_eq!(store.saves().await, vec![first, second]);
    }
}
