//! Where certificate bytes come from.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::error::{CertificateError, Result};
use super::record::CertificateRecord;
use crate::storage::repositories::ClientCertificateRepository;

/// Origin of client certificate material.
///
/// Implementations must be `Send + Sync`; a single source is shared by every
/// connection the process opens.
#[async_trait]
pub trait CertificateSource: Send + Sync + std::fmt::Debug {
    /// Fetch the certificate stored for `identity`.
    ///
    /// # Errors
    ///
    /// - `CertificateError::Unavailable` if nothing is stored for the identity
    /// - `CertificateError::Storage` if the store could not be queried
    async fn fetch(&self, identity: &str) -> Result<CertificateRecord>;
}

/// Certificate source backed by the `client_certificates` table.
#[derive(Clone)]
pub struct DbCertificateSource {
    repository: Arc<dyn ClientCertificateRepository>,
}

impl std::fmt::Debug for DbCertificateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCertificateSource").finish_non_exhaustive()
    }
}

impl DbCertificateSource {
    pub fn new(repository: Arc<dyn ClientCertificateRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CertificateSource for DbCertificateSource {
    async fn fetch(&self, identity: &str) -> Result<CertificateRecord> {
        debug!(identity = %identity, "Loading client certificate from nsx-db");

        let record = self.repository.get(identity).await.map_err(|e| {
            error!(identity = %identity, error = %e, "Client certificate lookup failed");
            CertificateError::storage(e.to_string())
        })?;

        record.ok_or_else(|| CertificateError::unavailable(identity))
    }
}
