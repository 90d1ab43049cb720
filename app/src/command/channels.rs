use embedsync_config::Config;
use embedsync_pipeline::{ChannelSync, RunOutcome};
use embedsync_providers::NeynarClient;
use embedsync_store::SqlStore;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{CheckpointSlot, Job};

#[derive(Debug, Clone)]
pub struct SyncChannelsInput {
    pub config: Option<PathBuf>,
    pub page_size: Option<u64>,
}

/// Strategy for refreshing followed channels from the Neynar API.
#[derive(Debug, Clone, Copy)]
pub struct SyncChannelsStrategy;

impl super::CommandStrategy for SyncChannelsStrategy {
    type Input = SyncChannelsInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut config = Config::load(input.config.as_deref())?;
        if let Some(page_size) = input.page_size {
            config.pipeline.page_size = page_size;
        }

        let source = NeynarClient::new(config.require_neynar_key()?.to_string())
            .with_base_url(config.providers.neynar.base_url.clone());
        let store = SqlStore::connect(&config.database.url).await?;
        store.ensure_schema().await?;
        let checkpoints = CheckpointSlot::open(&config, Job::Channels).await?;

        let report = ChannelSync::new(store, source, checkpoints, config.pipeline.clone())
            .run()
            .await?;

        match report.outcome {
            RunOutcome::Completed => info!(
                "Channel sync complete: {} of {} users updated",
                report.updated, report.users
            ),
            RunOutcome::Halted => warn!(
                "Channel sync halted at offset {}; run again to resume",
                report.checkpoint.last_processed_offset
            ),
        }
        Ok(())
    }
}
