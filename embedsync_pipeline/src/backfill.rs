//! Seeds the `users` table from the raw cast archive.
//!
//! Shares the paging, retry, checkpoint and halt policy of the enrichment
//! run, but keeps its offset in a separate checkpoint slot.

use embedsync_core::{CastArchive, Checkpoint, CheckpointStore, StoreError, UserSeed};
use tracing::info;

use crate::config::PipelineConfig;
use crate::fetcher::RetryingFetcher;
use crate::orchestrator::RunOutcome;
use crate::paging::{PageCount, drive_pages};

#[derive(Debug, Clone)]
pub struct BackfillReport {
    pub outcome: RunOutcome,
    /// Cast records consumed
    pub records: u64,
    /// User rows upserted
    pub upserted: u64,
    pub checkpoint: Checkpoint,
}

pub struct Backfill<S, C> {
    fetcher: RetryingFetcher<S>,
    checkpoints: C,
    config: PipelineConfig,
}

impl<S, C> Backfill<S, C>
where
    S: CastArchive,
    C: CheckpointStore,
{
    pub const fn new(archive: S, checkpoints: C, config: PipelineConfig) -> Self {
        Self {
            fetcher: RetryingFetcher::new(archive, config.retry_policy()),
            checkpoints,
            config,
        }
    }

    pub async fn run(&self) -> anyhow::Result<BackfillReport> {
        let run = drive_pages("backfill", &self.checkpoints, &self.config, move |offset| {
            self.seed_page(offset)
        })
        .await?;

        info!(
            "Backfill finished: {} records read, {} users upserted",
            run.totals.rows, run.totals.written
        );
        Ok(BackfillReport {
            outcome: run.outcome,
            records: run.totals.rows,
            upserted: run.totals.written,
            checkpoint: run.checkpoint,
        })
    }

    async fn seed_page(&self, offset: u64) -> Result<PageCount, StoreError> {
        let bundles = self
            .fetcher
            .read_cast_page(offset, self.config.page_size)
            .await?;
        if bundles.is_empty() {
            return Ok(PageCount::default());
        }

        let seeds = UserSeed::from_bundles(&bundles);
        if !seeds.is_empty() {
            self.fetcher.upsert_users(&seeds).await?;
        }
        Ok(PageCount {
            rows: bundles.len() as u64,
            written: seeds.len() as u64,
            failed: 0,
        })
    }
}
