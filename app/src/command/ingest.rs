use embedsync_config::Config;
use embedsync_pipeline::CastIngest;
use embedsync_providers::NeynarClient;
use embedsync_store::SqlStore;
use std::path::PathBuf;
use tracing::info;

/// Strategy for pulling power users' casts into the `casts` table.
#[derive(Debug, Clone, Copy)]
pub struct IngestCastsStrategy;

impl super::CommandStrategy for IngestCastsStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.as_deref())?;

        let source = NeynarClient::new(config.require_neynar_key()?.to_string())
            .with_base_url(config.providers.neynar.base_url.clone());
        let store = SqlStore::connect(&config.database.url).await?;
        store.ensure_schema().await?;

        let report = CastIngest::new(store, source, config.pipeline.clone())
            .run()
            .await?;

        info!(
            "Ingested casts for {} of {} power users ({} failed)",
            report.written, report.users, report.failed
        );
        Ok(())
    }
}
