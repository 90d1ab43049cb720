//! The checkpointed page loop shared by the maintenance jobs.

use anyhow::Context;
use embedsync_core::{Checkpoint, CheckpointStore, StoreError};
use std::future::Future;
use tracing::{error, info, warn};

use crate::backoff::pause;
use crate::config::PipelineConfig;
use crate::orchestrator::RunOutcome;

/// What one page contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCount {
    /// Source rows consumed
    pub rows: u64,
    /// Rows that produced a write
    pub written: u64,
    /// Rows whose own write or lookup failed
    pub failed: u64,
}

#[derive(Debug, Clone)]
pub struct PagedRun {
    pub outcome: RunOutcome,
    pub checkpoint: Checkpoint,
    pub totals: PageCount,
}

/// Wait after a page-level failure, unless it was the one that halts the run.
pub async fn pause_after_failure(config: &PipelineConfig, consecutive_errors: u32) {
    if consecutive_errors < config.max_consecutive_errors {
        pause(config.failure_delay()).await;
    }
}

/// Inclusive row range of the page at `offset`, for log lines.
pub(crate) fn page_end(offset: u64, page_size: u64) -> u64 {
    offset.saturating_add(page_size).saturating_sub(1)
}

/// Run `page` from the stored offset until a short or empty page, or until
/// `max_consecutive_errors` pages fail in a row.
///
/// The checkpoint is saved after every page and cleared once the source is
/// exhausted. A failed save counts as a failed page and the same offset is
/// tried again.
pub async fn drive_pages<C, F, Fut>(
    job: &str,
    checkpoints: &C,
    config: &PipelineConfig,
    mut page: F,
) -> anyhow::Result<PagedRun>
where
    C: CheckpointStore,
    F: FnMut(u64) -> Fut + Send,
    Fut: Future<Output = Result<PageCount, StoreError>> + Send,
{
    config.validate()?;

    let mut checkpoint = checkpoints
        .load()
        .await
        .with_context(|| format!("Failed to load {job} checkpoint"))?
        .unwrap_or_default();
    info!(
        "Starting {job} from offset {}",
        checkpoint.last_processed_offset
    );

    let threshold = config.max_consecutive_errors;
    let page_size = config.page_size;
    let mut consecutive_errors = 0;
    let mut totals = PageCount::default();

    while consecutive_errors < threshold {
        let offset = checkpoint.last_processed_offset;
        info!("{job}: fetching {offset} to {}...", page_end(offset, page_size));

        let count = match page(offset).await {
            Ok(count) => count,
            Err(e) => {
                error!("{job}: range starting at {offset} failed after all retries: {e}");
                consecutive_errors += 1;
                pause_after_failure(config, consecutive_errors).await;
                continue;
            }
        };

        if count.rows == 0 {
            break;
        }

        let next = checkpoint.advance(count.rows, count.written, Vec::new());
        if let Err(e) = checkpoints.save(&next).await {
            error!("{job}: failed to persist checkpoint at offset {offset}: {e:#}");
            consecutive_errors += 1;
            pause_after_failure(config, consecutive_errors).await;
            continue;
        }

        checkpoint = next;
        consecutive_errors = 0;
        totals.rows += count.rows;
        totals.written += count.written;
        totals.failed += count.failed;
        info!(
            "{job}: processed {} rows. Total processed so far: {}",
            count.rows, totals.rows
        );

        if count.rows < page_size {
            break;
        }
        pause(config.delay()).await;
    }

    let outcome = if consecutive_errors >= threshold {
        warn!("{job}: stopped due to too many consecutive errors");
        RunOutcome::Halted
    } else {
        if let Err(e) = checkpoints.clear().await {
            warn!("{job}: failed to clear checkpoint: {e:#}");
        }
        RunOutcome::Completed
    };

    Ok(PagedRun {
        outcome,
        checkpoint,
        totals,
    })
}
