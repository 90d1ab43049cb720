use embedsync_config::Config;
use std::path::PathBuf;

/// Strategy for initializing the configuration.
///
/// Writes the template to `--config` or `~/embedsync/config.json`, never
/// over an existing file.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config_path = Config::create_config(input.as_deref())?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your OpenAI API key (or export OPENAI_API_KEY)");
        println!("   2. Add your Neynar API key (or export NEYNAR_API_KEY)");
        println!("   3. Point database.url at the database holding users and casts");
        println!(
            "   4. Run 'embedsync ingest-casts', 'embedsync backfill' and 'embedsync sync-channels', then 'embedsync run'"
        );
        println!();
        Ok(())
    }
}
