//! Static strategy pattern for CLI commands.
//!
//! Each command is its own zero-sized strategy type with its own input type,
//! dispatched statically from `main`.

use async_trait::async_trait;
use clap::ValueEnum;
use embedsync_config::{CheckpointBackend, Config};
use embedsync_core::{Checkpoint, CheckpointStore};
use embedsync_pipeline::FileCheckpointStore;
use embedsync_store::DbCheckpointStore;
use tracing::info;

mod backfill;
mod channels;
mod ingest;
mod init;
mod run;
mod slot;
mod version;

pub use backfill::{BackfillInput, BackfillStrategy};
pub use channels::{SyncChannelsInput, SyncChannelsStrategy};
pub use ingest::IngestCastsStrategy;
pub use init::InitStrategy;
pub use run::{RunInput, RunStrategy};
pub use slot::{ResetStrategy, SlotInput, StatusStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Which checkpoint slot a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Job {
    /// The embedding pipeline (`run`)
    Embeddings,
    /// The users backfill (`backfill`)
    Backfill,
    /// The channel refresh (`sync-channels`)
    Channels,
}

impl Job {
    fn name(self, config: &Config) -> &str {
        match self {
            Self::Embeddings => &config.checkpoint.embeddings_job,
            Self::Backfill => &config.checkpoint.backfill_job,
            Self::Channels => &config.checkpoint.channels_job,
        }
    }
}

/// The checkpoint backend selected in config.
pub enum CheckpointSlot {
    File(FileCheckpointStore),
    Database(DbCheckpointStore),
}

impl CheckpointSlot {
    pub async fn open(config: &Config, job: Job) -> anyhow::Result<Self> {
        let name = job.name(config);
        match config.checkpoint.backend {
            CheckpointBackend::File => {
                let path = config.checkpoint.file_for(name)?;
                info!("Checkpoint slot: {}", path.display());
                Ok(Self::File(FileCheckpointStore::new(path)))
            }
            CheckpointBackend::Database => Ok(Self::Database(
                DbCheckpointStore::connect(&config.database.url, name).await?,
            )),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(store) => store.path().display().to_string(),
            Self::Database(_) => "table pipeline_checkpoints".to_string(),
        }
    }
}

#[async_trait]
impl CheckpointStore for CheckpointSlot {
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        match self {
            Self::File(store) => store.load().await,
            Self::Database(store) => store.load().await,
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        match self {
            Self::File(store) => store.save(checkpoint).await,
            Self::Database(store) => store.save(checkpoint).await,
        }
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match self {
            Self::File(store) => store.clear().await,
            Self::Database(store) => store.clear().await,
        }
    }
}
