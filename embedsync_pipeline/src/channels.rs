//! Refreshes each user's followed channels from the social graph API.
//!
//! Pages through `users` by fid and asks the API for one user at a time.
//! A user whose lookup or write fails is logged and counted; only a failed
//! page read counts toward the halt threshold.

use embedsync_core::{ChannelStore, Checkpoint, CheckpointStore, SocialSource, StoreError};
use tracing::{debug, error, info};

use crate::backoff::pause;
use crate::config::PipelineConfig;
use crate::fetcher::RetryingFetcher;
use crate::orchestrator::RunOutcome;
use crate::paging::{PageCount, drive_pages};

#[derive(Debug, Clone)]
pub struct ChannelSyncReport {
    pub outcome: RunOutcome,
    /// Users visited
    pub users: u64,
    /// Users whose channel list was written
    pub updated: u64,
    pub failed: u64,
    pub checkpoint: Checkpoint,
}

pub struct ChannelSync<S, G, C> {
    fetcher: RetryingFetcher<S>,
    source: G,
    checkpoints: C,
    config: PipelineConfig,
}

impl<S, G, C> ChannelSync<S, G, C>
where
    S: ChannelStore,
    G: SocialSource,
    C: CheckpointStore,
{
    pub const fn new(store: S, source: G, checkpoints: C, config: PipelineConfig) -> Self {
        Self {
            fetcher: RetryingFetcher::new(store, config.retry_policy()),
            source,
            checkpoints,
            config,
        }
    }

    pub async fn run(&self) -> anyhow::Result<ChannelSyncReport> {
        let run = drive_pages("channel sync", &self.checkpoints, &self.config, move |offset| {
            self.sync_page(offset)
        })
        .await?;

        info!(
            "Completed updating channels: {} users, {} updated, {} failed",
            run.totals.rows, run.totals.written, run.totals.failed
        );
        Ok(ChannelSyncReport {
            outcome: run.outcome,
            users: run.totals.rows,
            updated: run.totals.written,
            failed: run.totals.failed,
            checkpoint: run.checkpoint,
        })
    }

    async fn sync_page(&self, offset: u64) -> Result<PageCount, StoreError> {
        let fids = self
            .fetcher
            .read_fids(offset, self.config.page_size)
            .await?;

        let mut count = PageCount {
            rows: fids.len() as u64,
            ..PageCount::default()
        };
        for fid in &fids {
            if self.sync_user(fid).await {
                count.written += 1;
            } else {
                count.failed += 1;
            }
            // API pacing, per user
            pause(self.config.delay() / 2).await;
        }
        Ok(count)
    }

    async fn sync_user(&self, fid: &str) -> bool {
        let channels = match self
            .fetcher
            .with_retry("fetch channels", || self.source.user_channels(fid))
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                error!("Failed to fetch channels for fid {fid} after all retries: {e:#}");
                return false;
            }
        };

        match self.fetcher.write_channels(fid, &channels).await {
            Ok(()) => {
                debug!("Updated {} channels for fid {fid}", channels.len());
                true
            }
            Err(e) => {
                error!("Error updating user channels for fid {fid}: {e}");
                false
            }
        }
    }
}
