use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::debug;

/// Create the table backing `entity` unless it already exists.
pub async fn ensure_table<E>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()>
where
    E: EntityTrait,
{
    let table = entity.table_name().to_owned();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();

    db.execute_unprepared(&backend.build(&stmt).to_string())
        .await?;

    debug!("Ensured table {table}");
    Ok(())
}
