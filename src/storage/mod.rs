//! # Storage and Persistence
//!
//! SQLite persistence for the client certificate and the QoS policy to
//! switching profile mappings.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use migrations::{get_migration_version, list_applied_migrations, MigrationInfo};
pub use pool::{create_pool, DbPool};
pub use repositories::{
    ClientCertificateRepository, QosPolicyMappingRepository, SqlxClientCertificateRepository,
    SqlxQosPolicyMappingRepository,
};

use crate::errors::{NsxError, Result};

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    migrations::run_migrations(pool).await
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| NsxError::database(e, "Database connectivity check failed"))?;

    Ok(())
}

/// Migrated single-connection in-memory database.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.expect("in-memory database")
}
