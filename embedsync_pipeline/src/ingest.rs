//! Pulls recent casts for the API's power users into the `casts` table.

use anyhow::Context;
use embedsync_core::{Cast, CastArchive, CastBundle, SocialSource};
use std::slice;
use tracing::{error, info};

use crate::backoff::pause;
use crate::config::PipelineConfig;
use crate::fetcher::RetryingFetcher;

/// Casts with empty text, or with an empty-string parent hash, are dropped.
/// Root casts carry no parent hash at all and are kept.
#[must_use]
pub fn keep_cast(cast: &Cast) -> bool {
    !cast.text.is_empty() && cast.parent_hash.as_deref() != Some("")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub users: u64,
    pub casts_seen: u64,
    pub casts_kept: u64,
    /// Cast records upserted
    pub written: u64,
    pub failed: u64,
}

pub struct CastIngest<S, G> {
    fetcher: RetryingFetcher<S>,
    source: G,
    config: PipelineConfig,
}

impl<S, G> CastIngest<S, G>
where
    S: CastArchive,
    G: SocialSource,
{
    pub const fn new(archive: S, source: G, config: PipelineConfig) -> Self {
        Self {
            fetcher: RetryingFetcher::new(archive, config.retry_policy()),
            source,
            config,
        }
    }

    /// Fetch the power-user list, then each user's casts in turn. A user
    /// whose fetch or write fails is counted and skipped.
    pub async fn run(&self) -> anyhow::Result<IngestReport> {
        let fids = self
            .fetcher
            .with_retry("fetch power users", || self.source.power_user_fids())
            .await
            .context("Failed to fetch power users")?;
        info!("Number of power users: {}", fids.len());

        let mut report = IngestReport {
            users: fids.len() as u64,
            ..IngestReport::default()
        };
        for fid in &fids {
            self.ingest_user(fid, &mut report).await;
            pause(self.config.delay() / 2).await;
        }

        info!(
            "Ingest finished: {} of {} casts kept, {} records written, {} users failed",
            report.casts_kept, report.casts_seen, report.written, report.failed
        );
        Ok(report)
    }

    async fn ingest_user(&self, fid: &str, report: &mut IngestReport) {
        let casts = match self
            .fetcher
            .with_retry("fetch casts", || self.source.user_casts(fid))
            .await
        {
            Ok(casts) => casts,
            Err(e) => {
                error!("Error fetching casts for fid {fid}: {e:#}");
                report.failed += 1;
                return;
            }
        };

        let seen = casts.len();
        let kept: Vec<Cast> = casts.into_iter().filter(keep_cast).collect();
        info!("FID {fid}: {seen} total casts, {} filtered casts", kept.len());
        report.casts_seen += seen as u64;
        report.casts_kept += kept.len() as u64;

        if kept.is_empty() {
            return;
        }
        let record = CastBundle {
            fid: fid.to_string(),
            casts: Some(kept),
        };
        match self.fetcher.upsert_casts(slice::from_ref(&record)).await {
            Ok(()) => report.written += 1,
            Err(e) => {
                error!("Failed to save casts for fid {fid}: {e}");
                report.failed += 1;
            }
        }
    }
}
