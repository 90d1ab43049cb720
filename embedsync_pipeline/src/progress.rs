use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Counters for one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Best-effort estimate of units to handle; zero when unknown
    pub total_units: u64,
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub start_time: DateTime<Utc>,
}

impl ProcessingStats {
    #[must_use]
    pub const fn handled(&self) -> u64 {
        self.processed + self.skipped + self.failed
    }
}

/// Accumulates [`ProcessingStats`] and logs rate and ETA at most once per
/// interval.
#[derive(Debug)]
pub struct ProgressTracker {
    stats: ProcessingStats,
    started: Instant,
    last_report: Instant,
    interval: Duration,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(total_units: u64, interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            stats: ProcessingStats {
                total_units,
                processed: 0,
                skipped: 0,
                failed: 0,
                start_time: Utc::now(),
            },
            started: now,
            last_report: now,
            interval,
        }
    }

    /// Add to the counters. Returns whether a progress line was emitted.
    pub fn update(&mut self, processed: u64, skipped: u64, failed: u64) -> bool {
        self.stats.processed += processed;
        self.stats.skipped += skipped;
        self.stats.failed += failed;

        if self.last_report.elapsed() >= self.interval {
            self.log_progress();
            self.last_report = Instant::now();
            return true;
        }
        false
    }

    /// Processed units per second since the run started.
    #[must_use]
    pub fn rate(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.stats.processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Time left at the current rate, or `None` while the rate is zero.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        let remaining = self.stats.total_units.saturating_sub(self.stats.handled());
        if remaining == 0 {
            return Some(Duration::ZERO);
        }
        let rate = self.rate();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining as f64 / rate))
    }

    pub fn log_progress(&self) {
        let eta = self
            .eta()
            .map_or_else(|| "unknown".to_string(), |eta| format!("{}s", eta.as_secs()));
        info!(
            "Progress: {}/{} processed, {} skipped, {} failed | Rate: {:.2}/s | ETA: {eta}",
            self.stats.processed,
            self.stats.total_units,
            self.stats.skipped,
            self.stats.failed,
            self.rate()
        );
    }

    #[must_use]
    pub const fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> ProcessingStats {
        self.stats
    }
}
