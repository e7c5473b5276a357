//! # Configuration Settings
//!
//! Defines the configuration structure for the NSX-V3 plugin glue.

use crate::errors::{NsxError, Result};
use crate::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// NSX manager connection settings
    #[validate(nested)]
    pub nsx_v3: NsxV3Config,

    /// Client certificate authentication
    #[validate(nested)]
    pub client_auth: ClientAuthConfig,

    /// QoS translation settings
    #[validate(nested)]
    pub qos: QosConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Build the configuration from `NSX_*` / `DATABASE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            nsx_v3: NsxV3Config::from_env(),
            client_auth: ClientAuthConfig::from_env()?,
            qos: QosConfig::from_env(),
            database: DatabaseConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file. Missing sections and keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| NsxError::Io {
            source: e,
            context: format!("Failed to read configuration file {}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(NsxError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.client_auth.enabled
            && self.client_auth.storage == ClientCertStorage::None
            && self.client_auth.cert_file.is_none()
        {
            return Err(NsxError::validation_field(
                "cert_file is required when client certificate storage is 'none'",
                "client_auth.cert_file",
            ));
        }

        if !self.database.is_sqlite() {
            return Err(NsxError::validation_field(
                "Database URL must start with 'sqlite://'",
                "database.url",
            ));
        }

        Ok(())
    }
}

/// NSX manager connection settings handed to nsxlib.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NsxV3Config {
    #[validate(length(min = 1, message = "NSX API user cannot be empty"))]
    pub nsx_api_user: String,

    pub nsx_api_password: SecretString,

    /// Manager addresses, `host[:port]` or full URLs
    pub nsx_api_managers: Vec<String>,

    /// Skip server certificate verification
    pub insecure: bool,

    pub ca_file: Option<PathBuf>,

    #[validate(range(max = 100, message = "HTTP retries must be at most 100"))]
    pub http_retries: u32,

    #[validate(range(min = 1, max = 100, message = "Retries must be between 1 and 100"))]
    pub retries: u32,

    #[validate(range(
        min = 1,
        max = 1000,
        message = "Concurrent connections must be between 1 and 1000"
    ))]
    pub concurrent_connections: u32,

    /// Seconds to wait for a connection
    #[validate(range(min = 1, message = "HTTP timeout must be at least 1 second"))]
    pub http_timeout: u64,

    /// Seconds to wait for a response
    #[validate(range(min = 1, message = "HTTP read timeout must be at least 1 second"))]
    pub http_read_timeout: u64,

    /// Seconds before an idle connection is validated again
    pub conn_idle_timeout: u64,

    pub nameservers: Vec<String>,

    #[validate(length(min = 1, message = "DNS domain cannot be empty"))]
    pub dns_domain: String,
}

impl Default for NsxV3Config {
    fn default() -> Self {
        Self {
            nsx_api_user: "admin".to_string(),
            nsx_api_password: SecretString::new("default"),
            nsx_api_managers: vec![],
            insecure: true,
            ca_file: None,
            http_retries: 3,
            retries: 10,
            concurrent_connections: 10,
            http_timeout: 10,
            http_read_timeout: 180,
            conn_idle_timeout: 10,
            nameservers: vec![],
            dns_domain: "openstacklocal".to_string(),
        }
    }
}

impl NsxV3Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    pub fn http_read_timeout(&self) -> Duration {
        Duration::from_secs(self.http_read_timeout)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            nsx_api_user: env_var("NSX_API_USER").unwrap_or(defaults.nsx_api_user),
            nsx_api_password: env_var("NSX_API_PASSWORD")
                .map(SecretString::new)
                .unwrap_or(defaults.nsx_api_password),
            nsx_api_managers: env_list("NSX_API_MANAGERS"),
            insecure: env_bool("NSX_INSECURE", defaults.insecure),
            ca_file: env_var("NSX_CA_FILE").map(PathBuf::from),
            http_retries: env_parse("NSX_HTTP_RETRIES", defaults.http_retries),
            retries: env_parse("NSX_RETRIES", defaults.retries),
            concurrent_connections: env_parse(
                "NSX_CONCURRENT_CONNECTIONS",
                defaults.concurrent_connections,
            ),
            http_timeout: env_parse("NSX_HTTP_TIMEOUT", defaults.http_timeout),
            http_read_timeout: env_parse("NSX_HTTP_READ_TIMEOUT", defaults.http_read_timeout),
            conn_idle_timeout: env_parse("NSX_CONN_IDLE_TIMEOUT", defaults.conn_idle_timeout),
            nameservers: env_list("NSX_NAMESERVERS"),
            dns_domain: env_var("NSX_DNS_DOMAIN").unwrap_or(defaults.dns_domain),
        }
    }
}

/// Where the client certificate lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClientCertStorage {
    /// Admin-managed file at `client_auth.cert_file`
    #[serde(rename = "none")]
    None,
    /// Stored in the plugin database
    #[default]
    #[serde(rename = "nsx-db")]
    NsxDb,
}

impl ClientCertStorage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCertStorage::None => "none",
            ClientCertStorage::NsxDb => "nsx-db",
        }
    }
}

impl fmt::Display for ClientCertStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientCertStorage {
    type Err = NsxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ClientCertStorage::None),
            "nsx-db" => Ok(ClientCertStorage::NsxDb),
            other => Err(NsxError::validation_field(
                format!("Unknown client certificate storage '{}', expected 'nsx-db' or 'none'", other),
                "client_auth.storage",
            )),
        }
    }
}

/// Client certificate authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClientAuthConfig {
    /// Authenticate to NSX with a client certificate instead of basic auth
    pub enabled: bool,

    pub storage: ClientCertStorage,

    /// Admin-managed certificate, used when `storage` is `none`
    pub cert_file: Option<PathBuf>,

    #[validate(length(min = 1, message = "Certificate identity cannot be empty"))]
    pub identity: String,

    /// Warn when the certificate expires within this many days
    #[validate(range(min = 0, max = 3650, message = "Expiration alert must be between 0 and 3650 days"))]
    pub expiration_alert_days: i64,

    /// Directory the database certificate is written to while in use
    pub temp_dir: PathBuf,
}

impl Default for ClientAuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            storage: ClientCertStorage::default(),
            cert_file: None,
            identity: crate::certificates::NSX_OPENSTACK_IDENTITY.to_string(),
            expiration_alert_days: crate::certificates::DEFAULT_EXPIRATION_ALERT_DAYS,
            temp_dir: PathBuf::from("/tmp"),
        }
    }
}

impl ClientAuthConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let storage = match env_var("NSX_CLIENT_CERT_STORAGE") {
            Some(value) => value.parse()?,
            None => defaults.storage,
        };

        Ok(Self {
            enabled: env_bool("NSX_USE_CLIENT_AUTH", defaults.enabled),
            storage,
            cert_file: env_var("NSX_CLIENT_CERT_FILE").map(PathBuf::from),
            identity: env_var("NSX_CLIENT_CERT_IDENTITY").unwrap_or(defaults.identity),
            expiration_alert_days: env_parse(
                "NSX_CLIENT_CERT_EXPIRATION_ALERT_DAYS",
                defaults.expiration_alert_days,
            ),
            temp_dir: env_var("NSX_CLIENT_CERT_TEMP_DIR").map(PathBuf::from).unwrap_or(defaults.temp_dir),
        })
    }
}

/// QoS translation settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QosConfig {
    /// Peak bandwidth as a multiple of the average bandwidth
    #[validate(range(min = 1.0, message = "Peak bandwidth multiplier must be at least 1.0"))]
    pub peak_bw_multiplier: f64,
}

impl Default for QosConfig {
    fn default() -> Self {
        Self { peak_bw_multiplier: 2.0 }
    }
}

impl QosConfig {
    pub fn from_env() -> Self {
        Self {
            peak_bw_multiplier: env_parse(
                "NSX_QOS_PEAK_BW_MULTIPLIER",
                Self::default().peak_bw_multiplier,
            ),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/nsx.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_seconds: env_parse(
                "DATABASE_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            ),
            idle_timeout_seconds: env_parse(
                "DATABASE_IDLE_TIMEOUT_SECONDS",
                defaults.idle_timeout_seconds,
            ),
            auto_migrate: env_bool("DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error) or a full `EnvFilter` directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "nsx-plugin".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env_var("NSX_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env_var("NSX_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: env_bool("NSX_JSON_LOGGING", defaults.json_logging),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).and_then(|s| s.trim().parse::<T>().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_var(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env_var(key)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
