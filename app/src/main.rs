#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    BackfillInput, BackfillStrategy, CommandStrategy, IngestCastsStrategy, InitStrategy, Job,
    ResetStrategy, RunInput, RunStrategy, SlotInput, StatusStrategy, SyncChannelsInput,
    SyncChannelsStrategy, VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "embedsync")]
#[command(about = "Resumable profile embedding pipeline", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/embedsync/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate summaries and embeddings for users
    Run {
        /// Override pipeline.page_size
        #[arg(long)]
        page_size: Option<u64>,

        /// Also enrich users that already have a summary and embedding
        #[arg(long)]
        reprocess_enriched: bool,
    },
    /// Seed the users table from the casts archive
    Backfill {
        /// Override pipeline.page_size
        #[arg(long)]
        page_size: Option<u64>,
    },
    /// Refresh followed channels from the Neynar API
    SyncChannels {
        /// Override pipeline.page_size
        #[arg(long)]
        page_size: Option<u64>,
    },
    /// Fetch power users' casts from the Neynar API into the casts table
    IngestCasts,
    /// Print a checkpoint
    Status {
        #[arg(long, value_enum, default_value_t = Job::Embeddings)]
        job: Job,
    },
    /// Delete a checkpoint so the next run starts from the beginning
    Reset {
        #[arg(long, value_enum, default_value_t = Job::Embeddings)]
        job: Job,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Run {
            page_size,
            reprocess_enriched,
        } => {
            RunStrategy
                .execute(RunInput {
                    config,
                    page_size,
                    reprocess_enriched,
                })
                .await
        }
        Commands::Backfill { page_size } => {
            BackfillStrategy
                .execute(BackfillInput { config, page_size })
                .await
        }
        Commands::SyncChannels { page_size } => {
            SyncChannelsStrategy
                .execute(SyncChannelsInput { config, page_size })
                .await
        }
        Commands::IngestCasts => IngestCastsStrategy.execute(config).await,
        Commands::Status { job } => StatusStrategy.execute(SlotInput { config, job }).await,
        Commands::Reset { job } => ResetStrategy.execute(SlotInput { config, job }).await,
        Commands::Init => InitStrategy.execute(config).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
