use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{
    Cast, CastBundle, ChannelRef, EnrichedFields, EnrichmentUpdate, UserProfile, UserRecord,
    UserSeed,
};

/// Paged access to the users awaiting enrichment.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_users(&self) -> Result<u64, StoreError>;

    /// Rows ordered by fid so that offset paging is stable within a run.
    async fn fetch_users(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StoreError>;

    /// Cast records for the given fids. Missing fids are simply absent.
    async fn fetch_casts(&self, fids: &[String]) -> Result<Vec<CastBundle>, StoreError>;

    /// Update embedding and summary by fid. Repeating a write is harmless.
    async fn write_enrichments(&self, updates: &[EnrichmentUpdate]) -> Result<(), StoreError>;
}

/// Paged access to the raw cast archive, used to seed the users table.
#[async_trait]
pub trait CastArchive: Send + Sync {
    /// Cast records ordered by fid.
    async fn fetch_cast_page(&self, offset: u64, limit: u64)
    -> Result<Vec<CastBundle>, StoreError>;

    /// Insert or update users, keyed on fid.
    async fn upsert_users(&self, users: &[UserSeed]) -> Result<(), StoreError>;

    /// Insert or replace cast records, keyed on fid.
    async fn upsert_casts(&self, records: &[CastBundle]) -> Result<(), StoreError>;
}

/// The channel lists kept on each user row.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// User fids in fid order.
    async fn fetch_fids(&self, offset: u64, limit: u64) -> Result<Vec<String>, StoreError>;

    /// Replace the channels a user follows.
    async fn write_channels(&self, fid: &str, channels: &[ChannelRef]) -> Result<(), StoreError>;
}

/// Read access to the social graph API.
#[async_trait]
pub trait SocialSource: Send + Sync {
    /// Channels the user follows.
    async fn user_channels(&self, fid: &str) -> anyhow::Result<Vec<ChannelRef>>;

    async fn power_user_fids(&self) -> anyhow::Result<Vec<String>>;

    /// The user's most recent casts.
    async fn user_casts(&self, fid: &str) -> anyhow::Result<Vec<Cast>>;
}

/// The external transform that derives summary and embedding for a profile.
#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    async fn enrich(&self, profile: &UserProfile) -> anyhow::Result<EnrichedFields>;
}
