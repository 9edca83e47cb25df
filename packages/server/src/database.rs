use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::file;

/// Connect, then bring the schema up to date.
pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Ensure secondary indexes exist.
///
/// Schema sync only creates the primary key and unique constraints, so the
/// owner index backing the delete/rename ownership filters is created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_files_owner")
        .table(file::Entity)
        .col(file::Column::Owner)
        .to_owned();

    let backend = db.get_database_backend();
    match db.execute_raw(backend.build(&stmt)).await {
        Ok(_) => info!("Ensured index idx_files_owner exists"),
        Err(e) => warn!("Failed to create index idx_files_owner: {}", e),
    }

    Ok(())
}
