//! Integration tests for configuration management
//!
//! These tests validate that the configuration system reads environment
//! variables and TOML files.

use nsx_plugin::config::{AppConfig, ClientCertStorage};
use nsx_plugin::{NsxError, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "NSX_API_USER",
    "NSX_API_PASSWORD",
    "NSX_API_MANAGERS",
    "NSX_HTTP_RETRIES",
    "NSX_USE_CLIENT_AUTH",
    "NSX_CLIENT_CERT_STORAGE",
    "NSX_CLIENT_CERT_FILE",
    "NSX_CLIENT_CERT_EXPIRATION_ALERT_DAYS",
    "NSX_CLIENT_CERT_TEMP_DIR",
    "NSX_QOS_PEAK_BW_MULTIPLIER",
    "DATABASE_URL",
];

/// Runs `f` with the given variables set and every other known variable unset.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

    for key in VARS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    result
}

#[test]
fn test_config_defaults_integration() -> Result<()> {
    let config = with_env(&[], AppConfig::from_env)?;

    assert_eq!(config.nsx_v3.nsx_api_user, "admin");
    assert!(config.nsx_v3.nsx_api_managers.is_empty());
    assert!(!config.client_auth.enabled);
    assert_eq!(config.client_auth.storage, ClientCertStorage::NsxDb);
    assert_eq!(config.qos.peak_bw_multiplier, 2.0);
    Ok(())
}

#[test]
fn test_config_environment_integration() -> Result<()> {
    let config = with_env(
        &[
            ("NSX_API_USER", "neutron"),
            ("NSX_API_PASSWORD", "Admin!23Admin"),
            ("NSX_API_MANAGERS", "10.0.0.1, 10.0.0.2:8443,"),
            ("NSX_HTTP_RETRIES", "5"),
            ("NSX_USE_CLIENT_AUTH", "true"),
            ("NSX_CLIENT_CERT_STORAGE", "none"),
            ("NSX_CLIENT_CERT_FILE", "/etc/neutron/nsx.pem"),
            ("NSX_CLIENT_CERT_EXPIRATION_ALERT_DAYS", "7"),
            ("NSX_QOS_PEAK_BW_MULTIPLIER", "1.5"),
        ],
        AppConfig::from_env,
    )?;

    assert_eq!(config.nsx_v3.nsx_api_user, "neutron");
    assert_eq!(config.nsx_v3.nsx_api_password.expose_secret(), "Admin!23Admin");
    assert_eq!(config.nsx_v3.nsx_api_managers, vec!["10.0.0.1", "10.0.0.2:8443"]);
    assert_eq!(config.nsx_v3.http_retries, 5);
    assert!(config.client_auth.enabled);
    assert_eq!(config.client_auth.storage, ClientCertStorage::None);
    assert_eq!(config.client_auth.cert_file, Some(PathBuf::from("/etc/neutron/nsx.pem")));
    assert_eq!(config.client_auth.expiration_alert_days, 7);
    assert_eq!(config.qos.peak_bw_multiplier, 1.5);
    Ok(())
}

#[test]
fn test_invalid_environment_rejected() {
    let result = with_env(&[("NSX_CLIENT_CERT_STORAGE", "vault")], AppConfig::from_env);
    assert!(matches!(result, Err(NsxError::Validation { .. })));

    let result = with_env(
        &[("NSX_USE_CLIENT_AUTH", "1"), ("NSX_CLIENT_CERT_STORAGE", "none")],
        AppConfig::from_env,
    );
    assert!(matches!(result, Err(NsxError::Validation { .. })));

    let result = with_env(&[("NSX_QOS_PEAK_BW_MULTIPLIER", "0.9")], AppConfig::from_env);
    assert!(result.is_err());

    let result = with_env(&[("DATABASE_URL", "postgresql://localhost/neutron")], AppConfig::from_env);
    assert!(result.is_err());
}

#[test]
fn test_config_from_file() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nsx.toml");
    std::fs::write(
        &path,
        r#"
        [nsx_v3]
        nsx_api_managers = ["nsx-mgr.example.com"]
        insecure = false
        ca_file = "/etc/ssl/nsx-ca.pem"

        [client_auth]
        enabled = true
        storage = "nsx-db"
        temp_dir = "/run/neutron"

        [database]
        url = "sqlite://:memory:"
        "#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path)?;
    assert!(!config.nsx_v3.insecure);
    assert_eq!(config.nsx_v3.ca_file, Some(PathBuf::from("/etc/ssl/nsx-ca.pem")));
    assert_eq!(config.client_auth.temp_dir, PathBuf::from("/run/neutron"));
    assert_eq!(config.client_auth.expiration_alert_days, 30);
    assert_eq!(config.database.url, "sqlite://:memory:");

    assert!(matches!(
        AppConfig::from_file(dir.path().join("missing.toml")),
        Err(NsxError::Io { .. })
    ));
    Ok(())
}
