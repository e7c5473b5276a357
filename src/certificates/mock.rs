//! In-memory certificate source for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::error::{CertificateError, Result};
use super::record::CertificateRecord;
use super::source::CertificateSource;

/// Certificate source that serves a fixed record and counts fetches.
///
/// `set_fail_next(true)` makes the next fetch fail with a storage error;
/// `with_delay` slows fetches down so tests can overlap acquisitions.
#[derive(Debug, Default)]
pub struct MockCertificateSource {
    record: Mutex<Option<CertificateRecord>>,
    fetches: AtomicUsize,
    fail_next: AtomicBool,
    delay: Option<Duration>,
}

impl MockCertificateSource {
    pub fn new(record: CertificateRecord) -> Self {
        Self { record: Mutex::new(Some(record)), ..Default::default() }
    }

    /// A source with nothing stored; every fetch is `Unavailable`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_record(&self, record: Option<CertificateRecord>) {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = record;
    }

    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    /// Number of fetches attempted so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateSource for MockCertificateSource {
    async fn fetch(&self, identity: &str) -> Result<CertificateRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CertificateError::storage("simulated nsx-db failure"));
        }

        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .filter(|record| record.identity == identity)
            .ok_or_else(|| CertificateError::unavailable(identity))
    }
}
