use async_trait::async_trait;
use embedsync_core::{Checkpoint, CheckpointStore};
use embedsync_entities::pipeline_checkpoints;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::schema::ensure_table;

/// Checkpoint slot stored as one row of `pipeline_checkpoints`, keyed by job.
pub struct DbCheckpointStore {
    db: DatabaseConnection,
    job: String,
}

impl DbCheckpointStore {
    pub async fn connect(database_url: &str, job: impl Into<String>) -> anyhow::Result<Self> {
        let db = Database::connect(database_url).await?;
        Self::new(db, job).await
    }

    pub async fn new(db: DatabaseConnection, job: impl Into<String>) -> anyhow::Result<Self> {
        ensure_table(&db, pipeline_checkpoints::Entity).await?;
        let job = job.into();
        info!("Checkpoint slot: table pipeline_checkpoints, job {job}");
        Ok(Self { db, job })
    }
}

#[async_trait]
impl CheckpointStore for DbCheckpointStore {
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        let Some(row) = pipeline_checkpoints::Entity::find_by_id(self.job.clone())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_str(&row.payload)?))
    }

    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        let payload = serde_json::to_string(checkpoint)?;
        let now = chrono::Utc::now().naive_utc();

        let exists = pipeline_checkpoints::Entity::find_by_id(self.job.clone())
            .one(&self.db)
            .await?
            .is_some();

        let model = pipeline_checkpoints::ActiveModel {
            job: Set(self.job.clone()),
            payload: Set(payload),
            updated_at: Set(now),
        };

        if exists {
            model.update(&self.db).await?;
        } else {
            model.insert(&self.db).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        pipeline_checkpoints::Entity::delete_by_id(self.job.clone())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
