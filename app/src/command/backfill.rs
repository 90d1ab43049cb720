use embedsync_config::Config;
use embedsync_pipeline::{Backfill, RunOutcome};
use embedsync_store::SqlStore;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{CheckpointSlot, Job};

#[derive(Debug, Clone)]
pub struct BackfillInput {
    pub config: Option<PathBuf>,
    pub page_size: Option<u64>,
}

/// Strategy for seeding `users` from the casts archive.
#[derive(Debug, Clone, Copy)]
pub struct BackfillStrategy;

impl super::CommandStrategy for BackfillStrategy {
    type Input = BackfillInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut config = Config::load(input.config.as_deref())?;
        if let Some(page_size) = input.page_size {
            config.pipeline.page_size = page_size;
        }

        let store = SqlStore::connect(&config.database.url).await?;
        store.ensure_schema().await?;
        let checkpoints = CheckpointSlot::open(&config, Job::Backfill).await?;

        let report = Backfill::new(store, checkpoints, config.pipeline.clone())
            .run()
            .await?;

        match report.outcome {
            RunOutcome::Completed => info!(
                "Backfill complete: {} users upserted from {} records",
                report.upserted, report.records
            ),
            RunOutcome::Halted => warn!(
                "Backfill halted at offset {}; run again to resume",
                report.checkpoint.last_processed_offset
            ),
        }
        Ok(())
    }
}
