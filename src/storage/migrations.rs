//! # Database Migration Management
//!
//! Schema migrations are embedded in the binary from `migrations/` and applied
//! on startup when `database.auto_migrate` is enabled, or by `nsx-cert`.

use crate::errors::{NsxError, Result};
use crate::storage::DbPool;
use serde::Serialize;
use sqlx::migrate::Migrator;
use tracing::{error, info};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// An applied migration as recorded by sqlx
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MigrationInfo {
    pub version: i64,
    pub description: String,
    pub success: bool,
}

/// Apply all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        NsxError::from(e)
    })?;

    info!("Database migrations completed");
    Ok(())
}

/// Latest applied migration version, `None` on a fresh database
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    Ok(list_applied_migrations(pool).await?.last().map(|m| m.version))
}

pub async fn list_applied_migrations(pool: &DbPool) -> Result<Vec<MigrationInfo>> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| NsxError::database(e, "Failed to check migration table"))?;

    if exists == 0 {
        return Ok(vec![]);
    }

    sqlx::query_as::<_, MigrationInfo>(
        "SELECT version, description, success FROM _sqlx_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| NsxError::database(e, "Failed to list applied migrations"))
}
