//! Durable progress record for resumable runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Progress of a paged run.
///
/// `last_processed_offset` counts source rows consumed, whether or not they
/// were enriched, and never decreases within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub last_processed_offset: u64,
    pub total_processed: u64,
    #[serde(default, alias = "failedFids")]
    pub failed_keys: BTreeSet<String>,
    pub timestamp: DateTime<Utc>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            last_processed_offset: 0,
            total_processed: 0,
            failed_keys: BTreeSet::new(),
            timestamp: Utc::now(),
        }
    }
}

impl Checkpoint {
    /// The checkpoint after a page of `rows` source rows has been handled.
    #[must_use]
    pub fn advance<I>(&self, rows: u64, enriched: u64, newly_failed: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut failed_keys = self.failed_keys.clone();
        failed_keys.extend(newly_failed);
        Self {
            last_processed_offset: self.last_processed_offset + rows,
            total_processed: self.total_processed + enriched,
            failed_keys,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn has_failed(&self, key: &str) -> bool {
        self.failed_keys.contains(key)
    }
}

/// A single durable slot holding one [`Checkpoint`].
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Returns `Ok(None)` when the slot is empty.
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>>;

    /// Overwrite the slot.
    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()>;

    /// Empty the slot. Clearing an empty slot succeeds.
    async fn clear(&self) -> anyhow::Result<()>;
}
