//! Integration tests for the database-backed scoped certificate file.

mod common;

use common::{certificate_expiring_in, file_count};
use nsx_plugin::certificates::{
    CertificateError, CertificateScope, DbCertProvider, MockCertificateSource,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn provider(dir: &TempDir, source: Arc<MockCertificateSource>) -> DbCertProvider {
    DbCertProvider::new(source).with_temp_dir(dir.path())
}

#[tokio::test]
async fn test_file_exists_only_while_scopes_are_active() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = provider(&dir, source.clone());

    assert_eq!(provider.path(), None);
    assert_eq!(provider.reference_count(), 0);

    let first = provider.acquire().await.unwrap();
    let path = first.path().to_path_buf();
    assert!(path.exists());
    assert_eq!(provider.reference_count(), 1);

    let second = provider.acquire().await.unwrap();
    assert_eq!(second.path(), path);
    assert_eq!(provider.reference_count(), 2);
    assert_eq!(source.fetch_count(), 1);

    drop(first);
    assert!(path.exists());
    assert_eq!(provider.reference_count(), 1);

    drop(second);
    assert!(!path.exists());
    assert_eq!(provider.reference_count(), 0);
    assert_eq!(provider.path(), None);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_one_fetch_per_materialization() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = provider(&dir, source.clone());

    for round in 1..=3 {
        let scopes: Vec<CertificateScope> = vec![
            provider.acquire().await.unwrap(),
            provider.acquire().await.unwrap(),
            provider.acquire().await.unwrap(),
        ];
        assert_eq!(source.fetch_count(), round);
        assert_eq!(provider.reference_count(), 3);
        drop(scopes);
        assert_eq!(file_count(dir.path()), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquirers_share_one_complete_file() {
    let dir = TempDir::new().unwrap();
    let record = certificate_expiring_in(365);
    let expected = record.export_pem();
    let source = Arc::new(
        MockCertificateSource::new(record).with_delay(Duration::from_millis(50)),
    );
    let provider = Arc::new(provider(&dir, source.clone()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let provider = Arc::clone(&provider);
        handles.push(tokio::spawn(async move {
            let scope = provider.acquire().await.unwrap();
            // Every acquirer must see the whole certificate, never a partial write
            let contents = tokio::fs::read_to_string(scope.path()).await.unwrap();
            (scope, contents)
        }));
    }

    let mut scopes = Vec::new();
    for handle in handles {
        let (scope, contents) = handle.await.unwrap();
        assert_eq!(contents, expected);
        scopes.push(scope);
    }

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(provider.reference_count(), 16);
    let path = scopes[0].path().to_path_buf();
    assert!(scopes.iter().all(|scope| scope.path() == path));

    drop(scopes);
    assert_eq!(provider.reference_count(), 0);
    assert!(!path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scopes_released_from_other_tasks() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = Arc::new(provider(&dir, source));

    let mut handles = Vec::new();
    for i in 0..32u64 {
        let provider = Arc::clone(&provider);
        handles.push(tokio::spawn(async move {
            let scope = provider.acquire().await.unwrap();
            assert!(scope.path().exists());
            tokio::time::sleep(Duration::from_millis(i % 5)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(provider.reference_count(), 0);
    assert_eq!(provider.path(), None);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_missing_certificate_leaves_no_scope() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir, Arc::new(MockCertificateSource::empty()));

    let err = provider.acquire().await.unwrap_err();
    assert!(matches!(err, CertificateError::Unavailable { .. }));
    assert_eq!(
        err.to_string(),
        "Unable to load client certificate 'com.vmware.nsx.openstack' from nsx-db"
    );
    assert_eq!(provider.reference_count(), 0);
    assert_eq!(provider.path(), None);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_failed_fetch_does_not_poison_later_acquires() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = provider(&dir, source.clone());

    source.set_fail_next(true);
    assert!(matches!(provider.acquire().await, Err(CertificateError::Storage { .. })));
    assert_eq!(provider.reference_count(), 0);

    let scope = provider.acquire().await.unwrap();
    assert!(scope.path().exists());
    assert_eq!(provider.reference_count(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_unwritable_temp_dir_is_io_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

    // Permission bits do not bind root
    if std::fs::write(locked.join("write-check"), b"x").is_ok() {
        return;
    }

    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = DbCertProvider::new(source).with_temp_dir(&locked);

    let err = provider.acquire().await.unwrap_err();
    assert!(matches!(err, CertificateError::Io { .. }));
    assert_eq!(provider.reference_count(), 0);
    assert_eq!(provider.path(), None);
}

#[tokio::test]
async fn test_cancelled_first_acquire_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        MockCertificateSource::new(certificate_expiring_in(365))
            .with_delay(Duration::from_millis(200)),
    );
    let provider = provider(&dir, source);

    let result = tokio::time::timeout(Duration::from_millis(20), provider.acquire()).await;
    assert!(result.is_err());
    assert_eq!(provider.reference_count(), 0);
    assert_eq!(file_count(dir.path()), 0);

    let scope = provider.acquire().await.unwrap();
    assert!(scope.path().exists());
}

#[tokio::test]
async fn test_externally_deleted_file_does_not_fail_release() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
    let provider = provider(&dir, source);

    let first = provider.acquire().await.unwrap();
    let second = provider.acquire().await.unwrap();
    std::fs::remove_file(first.path()).unwrap();

    drop(first);
    drop(second);
    assert_eq!(provider.reference_count(), 0);
    assert_eq!(provider.path(), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Acquire,
        Release(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Acquire), any::<usize>().prop_map(Op::Release)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn file_present_iff_scopes_active(ops in proptest::collection::vec(op(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let dir = TempDir::new().unwrap();
            let source = Arc::new(MockCertificateSource::new(certificate_expiring_in(365)));
            let provider = provider(&dir, source.clone());

            let mut scopes: Vec<CertificateScope> = Vec::new();
            let mut materializations = 0;
            for op in ops {
                match op {
                    Op::Acquire => {
                        if scopes.is_empty() {
                            materializations += 1;
                        }
                        scopes.push(runtime.block_on(provider.acquire()).unwrap());
                    }
                    Op::Release(i) if !scopes.is_empty() => {
                        let idx = i % scopes.len();
                        scopes.swap_remove(idx);
                    }
                    Op::Release(_) => {}
                }

                prop_assert_eq!(provider.reference_count(), scopes.len());
                prop_assert_eq!(provider.path().is_some(), !scopes.is_empty());
                prop_assert_eq!(file_count(dir.path()), usize::from(!scopes.is_empty()));
            }
            prop_assert_eq!(source.fetch_count(), materializations);

            scopes.clear();
            prop_assert_eq!(file_count(dir.path()), 0);
        }
    }
}
