//! Store access with bounded retries.
//!
//! Every read and write the pipeline makes against the record store goes
//! through [`RetryingFetcher`]. Transient failures are retried up to
//! `max_retries` times with [`backoff_delay`]; permanent failures and
//! exhausted budgets are returned to the caller. Calls to the social graph
//! API reuse the same loop through [`RetryingFetcher::with_retry`].

use embedsync_core::{
    CastArchive, CastBundle, ChannelRef, ChannelStore, EnrichmentUpdate, StoreError, UserRecord,
    UserSeed, UserStore,
};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::backoff::{backoff_delay, pause};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base of the linear backoff
    pub base_delay: Duration,
}

/// Errors that tell the retry loop whether another attempt may help.
pub trait Retryable: Display {
    fn is_transient(&self) -> bool;

    fn is_timeout(&self) -> bool {
        false
    }
}

impl Retryable for StoreError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }

    fn is_timeout(&self) -> bool {
        Self::is_timeout(self)
    }
}

/// HTTP and API failures carry no classification; all of them are retried.
impl Retryable for anyhow::Error {
    fn is_transient(&self) -> bool {
        true
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

pub struct RetryingFetcher<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S> RetryingFetcher<S> {
    pub const fn new(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }
}

impl<S> RetryingFetcher<S>
where
    S: Sync,
{
    /// Run `call` until it succeeds, fails permanently, or the retry budget
    /// is spent. Timeouts and other transient errors share one budget.
    pub async fn with_retry<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        T: Send,
        E: Retryable + Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let max = self.policy.max_retries;
        let mut retry_count = 0;

        loop {
            match call().await {
                Ok(value) => {
                    if retry_count > 0 {
                        info!("{operation} succeeded after {} attempts", retry_count + 1);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && retry_count < max => {
                    let wait = backoff_delay(self.policy.base_delay, retry_count);
                    if e.is_timeout() {
                        warn!(
                            "{operation} timed out, retrying after longer delay of {}ms (attempt {}/{max}): {e}",
                            wait.as_millis(),
                            retry_count + 1
                        );
                    } else {
                        warn!(
                            "{operation} failed, retrying in {}ms (attempt {}/{max}): {e}",
                            wait.as_millis(),
                            retry_count + 1
                        );
                    }
                    pause(wait).await;
                    retry_count += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!("{operation} failed after {} attempts: {e}", retry_count + 1);
                    } else {
                        error!("{operation} failed with a non-retryable error: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl<S> RetryingFetcher<S>
where
    S: UserStore,
{
    pub async fn count_users(&self) -> Result<u64, StoreError> {
        self.with_retry("count users", || self.store.count_users()).await
    }

    pub async fn read_page(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StoreError> {
        self.with_retry("read users page", || self.store.fetch_users(offset, limit))
            .await
    }

    pub async fn read_casts(&self, fids: &[String]) -> Result<Vec<CastBundle>, StoreError> {
        self.with_retry("read casts", || self.store.fetch_casts(fids))
            .await
    }

    pub async fn write_batch(&self, updates: &[EnrichmentUpdate]) -> Result<(), StoreError> {
        self.with_retry("write enrichments", || self.store.write_enrichments(updates))
            .await
    }
}

impl<S> RetryingFetcher<S>
where
    S: CastArchive,
{
    pub async fn read_cast_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CastBundle>, StoreError> {
        self.with_retry("read casts page", || self.store.fetch_cast_page(offset, limit))
            .await
    }

    pub async fn upsert_users(&self, seeds: &[UserSeed]) -> Result<(), StoreError> {
        self.with_retry("upsert users", || self.store.upsert_users(seeds))
            .await
    }

    pub async fn upsert_casts(&self, records: &[CastBundle]) -> Result<(), StoreError> {
        self.with_retry("upsert casts", || self.store.upsert_casts(records))
            .await
    }
}

impl<S> RetryingFetcher<S>
where
    S: ChannelStore,
{
    pub async fn read_fids(&self, offset: u64, limit: u64) -> Result<Vec<String>, StoreError> {
        self.with_retry("read fids page", || self.store.fetch_fids(offset, limit))
            .await
    }

    pub async fn write_channels(
        &self,
        fid: &str,
        channels: &[ChannelRef],
    ) -> Result<(), StoreError> {
        self.with_retry("write channels", || self.store.write_channels(fid, channels))
            .await
    }
}
