use embedsync_core::{EnrichedFields, EnrichmentUpdate, ProfileEnricher, UserProfile, UserStore};
use std::collections::BTreeSet;
use std::slice;
use tracing::{debug, warn};

use crate::fetcher::RetryingFetcher;

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichStatus {
    /// Enriched and written back.
    Success(EnrichedFields),
    /// Skipped because the key failed earlier.
    PreviouslyFailed,
    /// Enrichment or write-back failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichResult {
    pub key: String,
    pub status: EnrichStatus,
}

/// Runs the enricher for one profile and writes the result back under its
/// key. Every failure becomes an [`EnrichResult`]; nothing escapes.
pub struct EnrichmentAdapter<E> {
    enricher: E,
}

impl<E> EnrichmentAdapter<E>
where
    E: ProfileEnricher,
{
    pub const fn new(enricher: E) -> Self {
        Self { enricher }
    }

    pub async fn enrich<S: UserStore>(
        &self,
        profile: &UserProfile,
        failed: &BTreeSet<String>,
        writer: &RetryingFetcher<S>,
    ) -> EnrichResult {
        let key = profile.fid.clone();

        if failed.contains(&key) {
            debug!("Skipping fid {key}: failed in an earlier attempt");
            return EnrichResult {
                key,
                status: EnrichStatus::PreviouslyFailed,
            };
        }

        let fields = match self.enricher.enrich(profile).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Enrichment failed for fid {key}: {e:#}");
                return EnrichResult {
                    key,
                    status: EnrichStatus::Failed(format!("{e:#}")),
                };
            }
        };

        let update = EnrichmentUpdate {
            fid: key.clone(),
            fields,
        };
        match writer.write_batch(slice::from_ref(&update)).await {
            Ok(()) => {
                debug!("Updated fid {key}");
                EnrichResult {
                    key,
                    status: EnrichStatus::Success(update.fields),
                }
            }
            Err(e) => {
                warn!("Write-back failed for fid {key}: {e}");
                EnrichResult {
                    key,
                    status: EnrichStatus::Failed(e.to_string()),
                }
            }
        }
    }
}
