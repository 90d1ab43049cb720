use embedsync_config::Config;
use embedsync_core::CheckpointStore;
use std::path::PathBuf;

use super::{CheckpointSlot, Job};

#[derive(Debug, Clone)]
pub struct SlotInput {
    pub config: Option<PathBuf>,
    pub job: Job,
}

/// Strategy for printing a checkpoint slot.
#[derive(Debug, Clone, Copy)]
pub struct StatusStrategy;

impl super::CommandStrategy for StatusStrategy {
    type Input = SlotInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.config.as_deref())?;
        let slot = CheckpointSlot::open(&config, input.job).await?;

        println!("Checkpoint ({})", slot.describe());
        match slot.load().await? {
            Some(checkpoint) => {
                println!("  Offset: {}", checkpoint.last_processed_offset);
                println!("  Processed: {}", checkpoint.total_processed);
                println!("  Failed keys: {}", checkpoint.failed_keys.len());
                println!("  Saved at: {}", checkpoint.timestamp.to_rfc3339());
                if !checkpoint.failed_keys.is_empty() {
                    println!("{}", serde_json::to_string_pretty(&checkpoint.failed_keys)?);
                }
            }
            None => println!("  (empty - next run starts at offset 0)"),
        }
        Ok(())
    }
}

/// Strategy for clearing a checkpoint slot.
#[derive(Debug, Clone, Copy)]
pub struct ResetStrategy;

impl super::CommandStrategy for ResetStrategy {
    type Input = SlotInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.config.as_deref())?;
        let slot = CheckpointSlot::open(&config, input.job).await?;

        slot.clear().await?;
        println!("Cleared checkpoint ({})", slot.describe());
        Ok(())
    }
}
