//! Common test utilities for all integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use nsx_plugin::certificates::{generate_self_signed, CertificateRecord, NSX_OPENSTACK_IDENTITY};
use nsx_plugin::config::DatabaseConfig;
use nsx_plugin::storage::{create_pool, DbPool};

/// Self-signed certificate for the plugin identity expiring in `days` days
/// plus an hour, so whole-day arithmetic is stable while the test runs.
pub fn certificate_expiring_in(days: i64) -> CertificateRecord {
    generate_self_signed(
        NSX_OPENSTACK_IDENTITY,
        "NSX Neutron plugin",
        Utc::now() + Duration::days(days) + Duration::hours(1),
    )
    .expect("generate test certificate")
}

/// Migrated in-memory database.
pub async fn memory_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.expect("in-memory database")
}

/// Number of entries in `dir`.
pub fn file_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
