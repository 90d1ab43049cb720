use embedsync_config::Config;
use embedsync_core::ChatParams;
use embedsync_pipeline::{Orchestrator, RunOutcome};
use embedsync_providers::{OpenAiProvider, ProfileEmbedder};
use embedsync_store::SqlStore;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{CheckpointSlot, Job};

#[derive(Debug, Clone)]
pub struct RunInput {
    pub config: Option<PathBuf>,
    pub page_size: Option<u64>,
    pub reprocess_enriched: bool,
}

/// Strategy for the embedding pipeline.
///
/// Wires the SQL record store, the OpenAI-backed enricher and the configured
/// checkpoint slot into an [`Orchestrator`] and drives one run.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut config = Config::load(input.config.as_deref())?;
        if let Some(page_size) = input.page_size {
            config.pipeline.page_size = page_size;
        }
        if input.reprocess_enriched {
            config.pipeline.reprocess_enriched = true;
        }

        let openai = &config.providers.openai;
        let provider = OpenAiProvider::new(config.require_api_key()?.to_string())
            .with_base_url(openai.base_url.clone());
        let enricher = ProfileEmbedder::new(
            provider,
            ChatParams {
                model: openai.chat_model.clone(),
                temperature: openai.temperature,
                max_tokens: openai.max_tokens,
            },
            openai.embedding_model.clone(),
        );

        let store = SqlStore::connect(&config.database.url).await?;
        store.ensure_schema().await?;
        let checkpoints = CheckpointSlot::open(&config, Job::Embeddings).await?;

        let report = Orchestrator::new(store, enricher, checkpoints, config.pipeline.clone())
            .run()
            .await?;

        match report.outcome {
            RunOutcome::Completed => info!(
                "Run complete: {} users enriched in total",
                report.checkpoint.total_processed
            ),
            RunOutcome::Halted => warn!(
                "Run halted at offset {}; run again to resume",
                report.checkpoint.last_processed_offset
            ),
        }
        Ok(())
    }
}
