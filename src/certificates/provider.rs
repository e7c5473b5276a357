//! Client certificate provider selection.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::error::Result;
use super::scoped::{DbCertProvider, Lease};
use super::source::CertificateSource;
use crate::config::{ClientAuthConfig, ClientCertStorage};
use crate::errors::NsxError;

/// Certificate file handed to the TLS client for the lifetime of the scope.
///
/// For the database-backed provider the file is removed once the last scope
/// referencing it is dropped.
#[derive(Debug)]
pub struct CertificateScope {
    path: PathBuf,
    _lease: Option<Lease>,
}

impl CertificateScope {
    pub(crate) fn leased(path: PathBuf, lease: Lease) -> Self {
        Self { path, _lease: Some(lease) }
    }

    pub(crate) fn unmanaged(path: PathBuf) -> Self {
        Self { path, _lease: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Supplies a client certificate file for a backend TLS handshake.
#[async_trait]
pub trait ClientCertProvider: Send + Sync + std::fmt::Debug {
    async fn acquire(&self) -> Result<CertificateScope>;

    fn storage(&self) -> ClientCertStorage;
}

#[async_trait]
impl ClientCertProvider for DbCertProvider {
    async fn acquire(&self) -> Result<CertificateScope> {
        DbCertProvider::acquire(self).await
    }

    fn storage(&self) -> ClientCertStorage {
        ClientCertStorage::NsxDb
    }
}

/// Admin-managed certificate file. Never created or removed by the plugin.
#[derive(Debug, Clone)]
pub struct StaticCertProvider {
    path: PathBuf,
}

impl StaticCertProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ClientCertProvider for StaticCertProvider {
    async fn acquire(&self) -> Result<CertificateScope> {
        Ok(CertificateScope::unmanaged(self.path.clone()))
    }

    fn storage(&self) -> ClientCertStorage {
        ClientCertStorage::None
    }
}

/// Pick the certificate provider for the configured client auth mode.
///
/// Returns `None` when client certificate auth is disabled.
pub fn get_client_cert_provider(
    config: &ClientAuthConfig,
    source: Option<Arc<dyn CertificateSource>>,
) -> crate::errors::Result<Option<Arc<dyn ClientCertProvider>>> {
    if !config.enabled {
        return Ok(None);
    }

    match config.storage {
        ClientCertStorage::None => {
            let path = config.cert_file.clone().ok_or_else(|| {
                NsxError::config(
                    "client_auth.cert_file must be set when client certificate storage is 'none'",
                )
            })?;
            info!(path = %path.display(), "Using admin-managed client certificate file");
            Ok(Some(Arc::new(StaticCertProvider::new(path))))
        }
        ClientCertStorage::NsxDb => {
            let source = source.ok_or_else(|| {
                NsxError::config(
                    "client certificate storage 'nsx-db' requires a database certificate source",
                )
            })?;
            info!(identity = %config.identity, "Using client certificate from nsx-db");
            Ok(Some(Arc::new(DbCertProvider::from_config(config, source))))
        }
    }
}
