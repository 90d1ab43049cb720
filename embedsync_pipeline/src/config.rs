use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::RetryPolicy;

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows fetched per page
    pub page_size: u64,
    /// Pause between pages and between enrichment windows; also the
    /// backoff base for store retries
    pub delay_between_requests_ms: u64,
    /// Retries per store call after the first attempt
    pub max_retries: u32,
    /// Enrichments running at once within a page
    pub parallel_limit: usize,
    /// Sequential page failures that halt the run
    pub max_consecutive_errors: u32,
    /// Minimum spacing of progress log lines
    pub progress_interval_secs: u64,
    /// Enrich rows that already carry an embedding and summary
    pub reprocess_enriched: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            delay_between_requests_ms: 2000,
            max_retries: 3,
            parallel_limit: 3,
            max_consecutive_errors: 3,
            progress_interval_secs: 5,
            reprocess_enriched: false,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    /// Wait applied after a page-level failure.
    #[must_use]
    pub const fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms.saturating_mul(2))
    }

    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.delay(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("pipeline.page_size must be at least 1");
        }
        if self.parallel_limit == 0 {
            anyhow::bail!("pipeline.parallel_limit must be at least 1");
        }
        if self.max_consecutive_errors == 0 {
            anyhow::bail!("pipeline.max_consecutive_errors must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{ "page_size": 50 }"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.parallel_limit, 3);
        assert_eq!(config.failure_delay(), Duration::from_millis(4000));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let config = PipelineConfig {
            parallel_limit: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(PipelineConfig::default().validate().is_ok());
    }
}
