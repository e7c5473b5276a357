//! # Structured Logging
//!
//! Subscriber setup for the `tracing` events emitted across the crate.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{NsxError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `log_level` when set. Returns `Ok(false)` if a
/// subscriber was already installed (tests, embedding applications).
pub fn init_logging(config: &ObservabilityConfig) -> Result<bool> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.log_level),
    }
    .map_err(|e| {
        NsxError::config_with_source(format!("Invalid log level '{}'", config.log_level), Box::new(e))
    })?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json_logging {
        builder.json().with_current_span(true).try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    Ok(installed)
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        nsx_managers = config.nsx_v3.nsx_api_managers.len(),
        nsx_api_user = %config.nsx_v3.nsx_api_user,
        client_auth = config.client_auth.enabled,
        cert_storage = %config.client_auth.storage,
        peak_bw_multiplier = config.qos.peak_bw_multiplier,
        database_url = %config.database.url,
        "NSX plugin configuration"
    );
}
