//! # NSX Plugin
//!
//! Glue between OpenStack Neutron and a VMware NSX-V3 backend.
//!
//! ## Core Components
//!
//! - **Client certificates**: a reference-counted certificate file written from
//!   the plugin database for the duration of a TLS handshake, or an
//!   admin-managed file, behind one [`certificates::ClientCertProvider`] trait
//! - **Backend connection**: [`backend::NsxLibConfig`] assembled from settings
//!   and the selected certificate provider
//! - **QoS**: translation of Neutron bandwidth limit and DSCP marking rules into
//!   NSX QoS switching profile values, and the notification handler keeping
//!   profiles in sync
//! - **Persistence**: SQLite through sqlx for certificates and policy mappings
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nsx_plugin::backend::{get_nsxlib_config, BackendCredentials};
//! use nsx_plugin::certificates::{CertificateSource, DbCertificateSource};
//! use nsx_plugin::storage::{create_pool, SqlxClientCertificateRepository};
//! use nsx_plugin::{AppConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(&config.database).await?;
//!     let repository = Arc::new(SqlxClientCertificateRepository::new(pool));
//!     let source: Arc<dyn CertificateSource> = Arc::new(DbCertificateSource::new(repository));
//!
//!     let nsxlib = get_nsxlib_config(&config, Some(source), BackendCredentials::default())?;
//!     if let Some(provider) = &nsxlib.client_cert_provider {
//!         let scope = provider.acquire().await?;
//!         println!("client certificate at {}", scope.path().display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod certificates;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod qos;
pub mod secrets;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{NsxError, Result};
pub use secrets::SecretString;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
