//! Client certificate repository.
//!
//! One row per identity in `client_certificates`. The plugin only reads it;
//! `nsx-cert` writes it.

use crate::certificates::CertificateRecord;
use crate::errors::{NsxError, Result};
use crate::secrets::SecretString;
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

/// Parse a timestamp string that may be in RFC 3339 format (from application)
/// or SQLite datetime format (from DEFAULT datetime('now')).
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(NsxError::validation(format!("Invalid timestamp format: {}", s)))
}

#[derive(Debug, Clone, FromRow)]
struct ClientCertificateRow {
    identity: String,
    certificate_pem: String,
    private_key_pem: String,
    expires_at: String,
}

impl TryFrom<ClientCertificateRow> for CertificateRecord {
    type Error = NsxError;

    fn try_from(row: ClientCertificateRow) -> Result<Self> {
        Ok(CertificateRecord {
            expires_at: parse_timestamp(&row.expires_at)?,
            identity: row.identity,
            certificate_pem: row.certificate_pem,
            private_key_pem: SecretString::new(row.private_key_pem),
        })
    }
}

#[async_trait]
pub trait ClientCertificateRepository: Send + Sync {
    /// Get the certificate stored for an identity.
    async fn get(&self, identity: &str) -> Result<Option<CertificateRecord>>;

    /// Insert or replace the certificate for `record.identity`.
    async fn save(&self, record: &CertificateRecord) -> Result<()>;

    async fn exists(&self, identity: &str) -> Result<bool>;

    /// Delete the certificate for an identity.
    ///
    /// Returns `NsxError::NotFound` if nothing is stored.
    async fn delete(&self, identity: &str) -> Result<()>;
}

pub struct SqlxClientCertificateRepository {
    pool: DbPool,
}

impl SqlxClientCertificateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientCertificateRepository for SqlxClientCertificateRepository {
    #[instrument(skip(self), fields(identity = %identity), name = "db_get_client_certificate")]
    async fn get(&self, identity: &str) -> Result<Option<CertificateRecord>> {
        let row = sqlx::query_as::<_, ClientCertificateRow>(
            r#"
            SELECT identity, certificate_pem, private_key_pem, expires_at
            FROM client_certificates
            WHERE identity = $1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            NsxError::database(e, format!("Failed to fetch client certificate: {}", identity))
        })?;

        row.map(|r| r.try_into()).transpose()
    }

    #[instrument(skip(self, record), fields(identity = %record.identity), name = "db_save_client_certificate")]
    async fn save(&self, record: &CertificateRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_certificates (identity, certificate_pem, private_key_pem, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(identity) DO UPDATE SET
                certificate_pem = excluded.certificate_pem,
                private_key_pem = excluded.private_key_pem,
                expires_at = excluded.expires_at,
                created_at = datetime('now')
            "#,
        )
        .bind(&record.identity)
        .bind(&record.certificate_pem)
        .bind(record.private_key_pem.expose_secret())
        .bind(record.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            NsxError::database(e, format!("Failed to save client certificate: {}", record.identity))
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(identity = %identity), name = "db_client_certificate_exists")]
    async fn exists(&self, identity: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM client_certificates WHERE identity = $1",
        )
        .bind(identity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            NsxError::database(e, format!("Failed to check client certificate: {}", identity))
        })?;

        Ok(count > 0)
    }

    #[instrument(skip(self), fields(identity = %identity), name = "db_delete_client_certificate")]
    async fn delete(&self, identity: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM client_certificates WHERE identity = $1")
            .bind(identity)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                NsxError::database(e, format!("Failed to delete client certificate: {}", identity))
            })?;

        if result.rows_affected() == 0 {
            return Err(NsxError::not_found("ClientCertificate", identity));
        }

        Ok(())
    }
}
