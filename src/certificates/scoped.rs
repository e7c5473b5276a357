//! Reference-counted client certificate file materialized from nsx-db.
//!
//! The first acquirer fetches the certificate, writes it to a freshly named
//! file under the temp directory and sets the reference count to one. Later
//! acquirers only bump the counter. Dropping the last [`CertificateScope`]
//! deletes the file.
//!
//! Two locks are involved:
//! - `gate` (async) serializes materialization so nobody is handed a path
//!   whose file is still being written;
//! - `state` (sync) guards `(path, ref_count)` and is the only lock release
//!   takes, so scopes can be dropped from any context.

use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::error::{CertificateError, Result};
use super::provider::CertificateScope;
use super::record::{CertificateRecord, NSX_OPENSTACK_IDENTITY};
use super::source::CertificateSource;
use crate::config::ClientAuthConfig;

/// Default threshold for the "certificate expires soon" warning.
pub const DEFAULT_EXPIRATION_ALERT_DAYS: i64 = 30;

const DEFAULT_TEMP_DIR: &str = "/tmp";
const FILE_NAME_MAX: u32 = 10_000_000;
const MAX_CREATE_ATTEMPTS: usize = 16;

#[derive(Debug, Default)]
struct ScopeState {
    path: Option<PathBuf>,
    ref_count: usize,
}

type SharedState = Arc<Mutex<ScopeState>>;

fn lock_state(state: &Mutex<ScopeState>) -> MutexGuard<'_, ScopeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One unit of the reference count; releases it on drop.
#[derive(Debug)]
pub(crate) struct Lease {
    state: SharedState,
}

impl Drop for Lease {
    fn drop(&mut self) {
        release(&self.state);
    }
}

fn release(state: &Mutex<ScopeState>) {
    let mut state = lock_state(state);
    state.ref_count = state.ref_count.saturating_sub(1);
    if state.ref_count > 0 {
        return;
    }

    let Some(path) = state.path.take() else {
        return;
    };

    match std::fs::remove_file(&path) {
        Ok(()) => debug!(path = %path.display(), "Removed client certificate file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Client certificate file already removed")
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove client certificate file")
        }
    }
}

/// A file created by the first acquirer that has not been handed out yet.
///
/// Removed on drop unless [`PendingFile::keep`] was called, which covers write
/// errors as well as an acquire future dropped mid-write.
struct PendingFile {
    path: Option<PathBuf>,
}

impl PendingFile {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove partial certificate file");
                }
            }
        }
    }
}

/// Client certificate provider backed by a [`CertificateSource`].
///
/// One instance is meant to live for the whole process and be shared by every
/// backend connection.
pub struct DbCertProvider {
    source: Arc<dyn CertificateSource>,
    identity: String,
    temp_dir: PathBuf,
    expiration_alert_days: i64,
    gate: tokio::sync::Mutex<()>,
    state: SharedState,
}

impl std::fmt::Debug for DbCertProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCertProvider")
            .field("identity", &self.identity)
            .field("temp_dir", &self.temp_dir)
            .field("expiration_alert_days", &self.expiration_alert_days)
            .field("path", &self.path())
            .field("reference_count", &self.reference_count())
            .finish_non_exhaustive()
    }
}

impl DbCertProvider {
    pub fn new(source: Arc<dyn CertificateSource>) -> Self {
        Self {
            source,
            identity: NSX_OPENSTACK_IDENTITY.to_string(),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            expiration_alert_days: DEFAULT_EXPIRATION_ALERT_DAYS,
            gate: tokio::sync::Mutex::new(()),
            state: SharedState::default(),
        }
    }

    pub fn from_config(config: &ClientAuthConfig, source: Arc<dyn CertificateSource>) -> Self {
        Self::new(source)
            .with_identity(config.identity.clone())
            .with_temp_dir(config.temp_dir.clone())
            .with_expiration_alert_days(config.expiration_alert_days)
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_expiration_alert_days(mut self, days: i64) -> Self {
        self.expiration_alert_days = days;
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Path of the materialized file, `None` while no scope is active.
    pub fn path(&self) -> Option<PathBuf> {
        lock_state(&self.state).path.clone()
    }

    pub fn reference_count(&self) -> usize {
        lock_state(&self.state).ref_count
    }

    /// Enter a certificate scope.
    ///
    /// Returns once the certificate file is completely written. The file stays
    /// on disk until every returned scope has been dropped.
    ///
    /// # Errors
    ///
    /// - `CertificateError::Unavailable` if the source holds no certificate
    /// - `CertificateError::Io` if the file cannot be written
    ///
    /// On error the reference count is left untouched and no file remains.
    pub async fn acquire(&self) -> Result<CertificateScope> {
        if let Some(scope) = self.try_join() {
            return Ok(scope);
        }

        let _gate = self.gate.lock().await;
        // Another acquirer may have materialized the file while we waited.
        if let Some(scope) = self.try_join() {
            return Ok(scope);
        }

        let pending = self.materialize().await?;
        Ok(self.install(pending.keep()))
    }

    fn try_join(&self) -> Option<CertificateScope> {
        let mut state = lock_state(&self.state);
        if state.ref_count == 0 {
            return None;
        }
        let path = state.path.clone()?;
        state.ref_count += 1;
        Some(CertificateScope::leased(path, self.lease()))
    }

    fn install(&self, path: PathBuf) -> CertificateScope {
        let mut state = lock_state(&self.state);
        state.path = Some(path.clone());
        state.ref_count = 1;
        CertificateScope::leased(path, self.lease())
    }

    fn lease(&self) -> Lease {
        Lease { state: Arc::clone(&self.state) }
    }

    async fn materialize(&self) -> Result<PendingFile> {
        let record = self.source.fetch(&self.identity).await?;

        tokio::fs::create_dir_all(&self.temp_dir).await.map_err(|e| {
            CertificateError::io(format!("Failed to create {}", self.temp_dir.display()), e)
        })?;

        let pending = self.write_exclusive(&record).await?;
        self.check_expiration(&record);

        if let Some(path) = pending.path.as_deref() {
            info!(identity = %self.identity, path = %path.display(), "Prepared client certificate file");
        }
        Ok(pending)
    }

    async fn write_exclusive(&self, record: &CertificateRecord) -> Result<PendingFile> {
        let contents = record.export_pem();

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let path = random_file_path(&self.temp_dir);
            let mut file = match open_exclusive(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Certificate file name taken, drawing another");
                    continue;
                }
                Err(e) => {
                    return Err(CertificateError::io(
                        format!("Failed to create {}", path.display()),
                        e,
                    ))
                }
            };

            let pending = PendingFile::new(path.clone());
            let write_error = |e| CertificateError::io(format!("Failed to write {}", path.display()), e);
            file.write_all(contents.as_bytes()).await.map_err(write_error)?;
            file.flush().await.map_err(write_error)?;
            file.sync_all().await.map_err(write_error)?;
            return Ok(pending);
        }

        Err(CertificateError::io(
            format!("No free certificate file name under {}", self.temp_dir.display()),
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ))
    }

    fn check_expiration(&self, record: &CertificateRecord) {
        let expires_in_days = record.expires_in_days(Utc::now());
        if expires_in_days > self.expiration_alert_days {
            return;
        }

        if expires_in_days < 0 {
            error!(
                identity = %self.identity,
                "Client certificate has expired {} days ago.",
                -expires_in_days
            );
        } else {
            warn!(
                identity = %self.identity,
                "Client certificate expires in {} days. Once expired, service will become unavailable.",
                expires_in_days
            );
        }
    }
}

fn random_file_path(dir: &Path) -> PathBuf {
    let n: u32 = rand::thread_rng().gen_range(1..=FILE_NAME_MAX);
    dir.join(format!(".{n}"))
}

async fn open_exclusive(path: &Path) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}
