//! Client certificate administration against the plugin database.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::output::{format_table, print_json, print_yaml, OutputFormat};
use crate::certificates::{generate_self_signed, inspect_certificate, CertificateRecord};
use crate::secrets::SecretString;
use crate::storage::ClientCertificateRepository;

/// Longest validity `generate` accepts, in days.
pub const MAX_VALID_DAYS: i64 = 36_500;

#[derive(Subcommand, Debug)]
pub enum CertificateCommands {
    /// Generate a self-signed client certificate and store it
    Generate {
        /// Subject common name
        #[arg(long, default_value = "NSX Neutron plugin")]
        subject: String,

        /// Validity in days
        #[arg(long, default_value_t = 3650, value_parser = clap::value_parser!(i64).range(1..=MAX_VALID_DAYS))]
        valid_days: i64,

        /// Replace an existing certificate
        #[arg(long)]
        force: bool,
    },

    /// Store an existing certificate and private key
    Import {
        /// PEM certificate file
        #[arg(long)]
        cert: PathBuf,

        /// PEM private key file
        #[arg(long)]
        key: PathBuf,

        /// Replace an existing certificate
        #[arg(long)]
        force: bool,
    },

    /// Show the stored certificate (never the private key)
    Show {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Delete the stored certificate
    Delete,
}

/// What `show` prints about a stored certificate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CertificateSummary {
    pub identity: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub expires_in_days: i64,
}

impl CertificateSummary {
    pub fn from_record(record: &CertificateRecord, now: DateTime<Utc>) -> Result<Self> {
        let info = inspect_certificate(&record.certificate_pem)
            .context("Stored certificate could not be parsed")?;
        Ok(Self {
            identity: record.identity.clone(),
            subject: info.subject,
            issuer: info.issuer,
            not_before: info.not_before,
            not_after: record.expires_at,
            expires_in_days: record.expires_in_days(now),
        })
    }

    fn table(&self) -> String {
        format_table(&[
            ("identity", self.identity.clone()),
            ("subject", self.subject.clone()),
            ("issuer", self.issuer.clone()),
            ("not_before", self.not_before.to_rfc3339()),
            ("not_after", self.not_after.to_rfc3339()),
            ("expires_in_days", self.expires_in_days.to_string()),
        ])
    }
}

pub async fn handle_certificate_command(
    command: CertificateCommands,
    repository: &dyn ClientCertificateRepository,
    identity: &str,
) -> Result<()> {
    match command {
        CertificateCommands::Generate { subject, valid_days, force } => {
            ensure_writable(repository, identity, force).await?;
            let Some(not_after) =
                Duration::try_days(valid_days).and_then(|d| Utc::now().checked_add_signed(d))
            else {
                bail!("--valid-days {} is out of range", valid_days);
            };
            let record = generate_self_signed(identity, &subject, not_after)?;
            repository.save(&record).await?;
            println!("Generated client certificate for '{}', expires {}", identity, record.expires_at);
        }
        CertificateCommands::Import { cert, key, force } => {
            ensure_writable(repository, identity, force).await?;
            let record = load_pem_files(identity, &cert, &key).await?;
            repository.save(&record).await?;
            println!("Imported client certificate for '{}', expires {}", identity, record.expires_at);
        }
        CertificateCommands::Show { output } => {
            let Some(record) = repository.get(identity).await? else {
                bail!("No client certificate stored for '{}'", identity);
            };
            let summary = CertificateSummary::from_record(&record, Utc::now())?;
            match output {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Yaml => print_yaml(&summary)?,
                OutputFormat::Table => println!("{}", summary.table()),
            }
        }
        CertificateCommands::Delete => {
            repository.delete(identity).await?;
            println!("Deleted client certificate for '{}'", identity);
        }
    }

    Ok(())
}

async fn ensure_writable(
    repository: &dyn ClientCertificateRepository,
    identity: &str,
    force: bool,
) -> Result<()> {
    if !force && repository.exists(identity).await? {
        bail!("A client certificate for '{}' already exists, use --force to replace it", identity);
    }
    Ok(())
}

async fn load_pem_files(identity: &str, cert: &Path, key: &Path) -> Result<CertificateRecord> {
    let certificate_pem = tokio::fs::read_to_string(cert)
        .await
        .with_context(|| format!("Failed to read certificate {}", cert.display()))?;
    let private_key_pem = tokio::fs::read_to_string(key)
        .await
        .with_context(|| format!("Failed to read private key {}", key.display()))?;

    Ok(CertificateRecord::from_pem(identity, certificate_pem, SecretString::new(private_key_pem))?)
}
