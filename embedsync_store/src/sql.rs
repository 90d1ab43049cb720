use async_trait::async_trait;
use embedsync_core::{
    CastArchive, CastBundle, ChannelRef, ChannelStore, EnrichmentUpdate, StoreError, UserRecord,
    UserSeed, UserStore,
};
use embedsync_entities::{casts, users};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

use crate::classify::classify_db_err;
use crate::convert;
use crate::schema::ensure_table;

/// Record store over the `users` and `casts` tables.
#[derive(Debug, Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to record store");
        let db = Database::connect(database_url).await?;
        Ok(Self::new(db))
    }

    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create `users` and `casts` if they are missing. Production tables are
    /// normally managed elsewhere; this is for local databases and tests.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        ensure_table(&self.db, users::Entity).await?;
        ensure_table(&self.db, casts::Entity).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqlStore {
    async fn count_users(&self) -> Result<u64, StoreError> {
        users::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))
    }

    async fn fetch_users(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StoreError> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Fid)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;

        debug!("Fetched {} users at offset {offset}", rows.len());
        Ok(rows.into_iter().map(convert::user_from_model).collect())
    }

    async fn fetch_casts(&self, fids: &[String]) -> Result<Vec<CastBundle>, StoreError> {
        if fids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = casts::Entity::find()
            .filter(casts::Column::Fid.is_in(fids.iter().cloned()))
            .all(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;

        Ok(rows.into_iter().map(convert::bundle_from_model).collect())
    }

    async fn write_enrichments(&self, updates: &[EnrichmentUpdate]) -> Result<(), StoreError> {
        for update in updates {
            users::ActiveModel {
                fid: Set(update.fid.clone()),
                embeddings: Set(Some(convert::embedding_to_json(&update.fields.embedding))),
                summary: Set(Some(update.fields.summary.clone())),
                ..Default::default()
            }
            .update(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CastArchive for SqlStore {
    async fn fetch_cast_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CastBundle>, StoreError> {
        let rows = casts::Entity::find()
            .order_by_asc(casts::Column::Fid)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;

        Ok(rows.into_iter().map(convert::bundle_from_model).collect())
    }

    async fn upsert_users(&self, seeds: &[UserSeed]) -> Result<(), StoreError> {
        if seeds.is_empty() {
            return Ok(());
        }

        let models = seeds.iter().map(|seed| users::ActiveModel {
            fid: Set(seed.fid.clone()),
            user_name: Set(seed.user_name.clone()),
            follower_count: Set(seed.follower_count),
            following_count: Set(seed.following_count),
            pfp_url: Set(seed.pfp_url.clone()),
            verified_addresses: Set(seed.verified_addresses.clone()),
            ..Default::default()
        });

        users::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(users::Column::Fid)
                    .update_columns([
                        users::Column::UserName,
                        users::Column::FollowerCount,
                        users::Column::FollowingCount,
                        users::Column::PfpUrl,
                        users::Column::VerifiedAddresses,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;

        debug!("Upserted {} users", seeds.len());
        Ok(())
    }

    async fn upsert_casts(&self, records: &[CastBundle]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let models = records
            .iter()
            .map(|record| {
                let document = record
                    .to_document()
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(casts::ActiveModel {
                    fid: Set(record.fid.clone()),
                    casts: Set(Some(document)),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        casts::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(casts::Column::Fid)
                    .update_column(casts::Column::Casts)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))?;

        debug!("Upserted {} cast records", records.len());
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for SqlStore {
    async fn fetch_fids(&self, offset: u64, limit: u64) -> Result<Vec<String>, StoreError> {
        users::Entity::find()
            .select_only()
            .column(users::Column::Fid)
            .order_by_asc(users::Column::Fid)
            .offset(offset)
            .limit(limit)
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| classify_db_err(&e))
    }

    async fn write_channels(&self, fid: &str, channels: &[ChannelRef]) -> Result<(), StoreError> {
        let channels =
            serde_json::to_value(channels).map_err(|e| StoreError::Decode(e.to_string()))?;

        users::ActiveModel {
            fid: Set(fid.to_string()),
            channels_following: Set(Some(channels)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| classify_db_err(&e))?;
        Ok(())
    }
}
