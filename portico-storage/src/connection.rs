//! Database connection management

use std::time::Duration;

use portico_config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::error::StorageResult;
use crate::migrations::Migrator;

pub use sea_orm::DatabaseConnection;

/// Open the connection pool and optionally run pending migrations.
pub async fn connect(config: &DatabaseConfig) -> StorageResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    if config.auto_migrate {
        info!("running pending database migrations");
        Migrator::up(&db, None).await?;
    }

    Ok(db)
}
