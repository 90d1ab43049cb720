//! The paged enrichment loop.
//!
//! ```text
//! INIT -> FETCH_PAGE -> BUILD_ITEMS -> ENRICH_PARALLEL -> PERSIST_CHECKPOINT
//!              ^                                                |
//!              +------------------------------------------------+--> DONE | HALTED
//! ```
//!
//! Pages are handled strictly one after another: the checkpoint for page N
//! is saved before page N+1 is fetched.

use anyhow::Context;
use embedsync_core::{
    Checkpoint, CheckpointStore, ProfileEnricher, SkipReason, StoreError, UserProfile, UserStore,
    WorkItem,
};
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::adapter::{EnrichResult, EnrichStatus, EnrichmentAdapter};
use crate::backoff::pause;
use crate::config::PipelineConfig;
use crate::fetcher::RetryingFetcher;
use crate::paging::{page_end, pause_after_failure};
use crate::progress::{ProcessingStats, ProgressTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The source was exhausted and the checkpoint cleared.
    Completed,
    /// Too many consecutive page failures; the checkpoint was kept.
    Halted,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: ProcessingStats,
    /// Last checkpoint state reached, whether or not it is still stored
    pub checkpoint: Checkpoint,
    /// Pages whose checkpoint was persisted
    pub pages: u64,
}

impl RunReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Counts from one fetched page, before they are committed.
#[derive(Debug, Default)]
struct PageTally {
    rows: u64,
    processed: u64,
    skipped: u64,
    failed: u64,
    newly_failed: Vec<String>,
}

pub struct Orchestrator<S, E, C> {
    fetcher: RetryingFetcher<S>,
    adapter: EnrichmentAdapter<E>,
    checkpoints: C,
    config: PipelineConfig,
}

impl<S, E, C> Orchestrator<S, E, C>
where
    S: UserStore,
    E: ProfileEnricher,
    C: CheckpointStore,
{
    pub const fn new(store: S, enricher: E, checkpoints: C, config: PipelineConfig) -> Self {
        Self {
            fetcher: RetryingFetcher::new(store, config.retry_policy()),
            adapter: EnrichmentAdapter::new(enricher),
            checkpoints,
            config,
        }
    }

    /// Drive the loop until the source is exhausted or the run halts.
    ///
    /// Page and item failures are absorbed. Only an invalid configuration
    /// or an unreadable checkpoint is returned as an error.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        self.config.validate()?;

        let mut checkpoint = self
            .checkpoints
            .load()
            .await
            .context("Failed to load checkpoint")?
            .unwrap_or_default();
        let mut failed_keys = checkpoint.failed_keys.clone();

        info!(
            "Starting from offset: {}, previously processed: {}",
            checkpoint.last_processed_offset, checkpoint.total_processed
        );
        if !failed_keys.is_empty() {
            info!(
                "Found {} previously failed fids that will be skipped",
                failed_keys.len()
            );
        }

        let total = match self.fetcher.count_users().await {
            Ok(count) => count.saturating_sub(checkpoint.last_processed_offset),
            Err(e) => {
                warn!("Could not get total user count: {e}");
                0
            }
        };
        let mut progress = ProgressTracker::new(total, self.config.progress_interval());

        let threshold = self.config.max_consecutive_errors;
        let page_size = self.config.page_size;
        let mut consecutive_errors = 0;
        let mut pages = 0;

        while consecutive_errors < threshold {
            let offset = checkpoint.last_processed_offset;
            info!(
                "Fetching users from {offset} to {}...",
                page_end(offset, page_size)
            );

            let tally = match self.process_page(offset, &failed_keys).await {
                Ok(tally) => tally,
                Err(e) => {
                    error!("Failed to process range starting at {offset}: {e}");
                    consecutive_errors += 1;
                    pause_after_failure(&self.config, consecutive_errors).await;
                    continue;
                }
            };

            if tally.rows == 0 {
                break;
            }

            failed_keys.extend(tally.newly_failed.iter().cloned());
            let next = checkpoint.advance(tally.rows, tally.processed, failed_keys.iter().cloned());
            if let Err(e) = self.checkpoints.save(&next).await {
                error!("Failed to persist checkpoint at offset {offset}: {e:#}");
                consecutive_errors += 1;
                pause_after_failure(&self.config, consecutive_errors).await;
                continue;
            }

            checkpoint = next;
            consecutive_errors = 0;
            pages += 1;
            progress.update(tally.processed, tally.skipped, tally.failed);

            if tally.rows < page_size {
                break;
            }
            pause(self.config.delay()).await;
        }

        progress.log_progress();
        let stats = progress.into_stats();

        let outcome = if consecutive_errors >= threshold {
            warn!("Stopped due to consecutive errors. Progress saved to checkpoint.");
            RunOutcome::Halted
        } else {
            info!("Processing completed successfully");
            if let Err(e) = self.checkpoints.clear().await {
                warn!("Failed to clear checkpoint: {e:#}");
            }
            RunOutcome::Completed
        };

        info!(
            "Final Stats: {} processed, {} skipped, {} failed",
            stats.processed, stats.skipped, stats.failed
        );

        Ok(RunReport {
            outcome,
            stats,
            checkpoint,
            pages,
        })
    }

    async fn process_page(
        &self,
        offset: u64,
        failed_keys: &BTreeSet<String>,
    ) -> Result<PageTally, StoreError> {
        let users = self
            .fetcher
            .read_page(offset, self.config.page_size)
            .await?;
        if users.is_empty() {
            return Ok(PageTally::default());
        }

        let fids: Vec<String> = users.iter().map(|u| u.fid.clone()).collect();
        debug!("Fetching casts for {} users...", fids.len());
        let bundles = self.fetcher.read_casts(&fids).await?;

        let items = WorkItem::build_page(&users, bundles, self.config.reprocess_enriched);
        let mut tally = PageTally {
            rows: users.len() as u64,
            ..PageTally::default()
        };

        let mut profiles = Vec::with_capacity(items.len());
        for item in &items {
            match &item.payload {
                Ok(profile) => profiles.push(profile),
                Err(SkipReason::MissingCasts) => {
                    debug!("Skipping fid {}: no cast data", item.key);
                    tally.skipped += 1;
                }
                Err(SkipReason::AlreadyEnriched) => {
                    debug!("Skipping fid {}: already enriched", item.key);
                    tally.skipped += 1;
                }
            }
        }

        for result in self.enrich_windows(&profiles, failed_keys).await {
            match result.status {
                EnrichStatus::Success(_) => tally.processed += 1,
                EnrichStatus::PreviouslyFailed => tally.failed += 1,
                EnrichStatus::Failed(_) => {
                    tally.failed += 1;
                    tally.newly_failed.push(result.key);
                }
            }
        }

        Ok(tally)
    }

    /// Enrich in windows of `parallel_limit`. A window finishes entirely
    /// before the next one starts.
    async fn enrich_windows(
        &self,
        profiles: &[&UserProfile],
        failed_keys: &BTreeSet<String>,
    ) -> Vec<EnrichResult> {
        let limit = self.config.parallel_limit;
        let mut results = Vec::with_capacity(profiles.len());

        let mut windows = profiles.chunks(limit).peekable();
        while let Some(window) = windows.next() {
            let outcomes = join_all(
                window
                    .iter()
                    .map(|profile| self.adapter.enrich(profile, failed_keys, &self.fetcher)),
            )
            .await;
            results.extend(outcomes);

            if windows.peek().is_some() {
                pause(self.config.delay()).await;
            }
        }

        results
    }
}
