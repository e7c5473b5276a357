//! # Configuration Management
//!
//! Settings for the NSX backend connection, client certificate auth, QoS
//! translation, the plugin database and logging. Loaded from environment
//! variables ([`AppConfig::from_env`]) or a TOML file ([`AppConfig::from_file`]).

pub mod settings;

pub use settings::{
    AppConfig, ClientAuthConfig, ClientCertStorage, DatabaseConfig, NsxV3Config,
    ObservabilityConfig, QosConfig,
};
