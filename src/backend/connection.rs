//! Backend connection configuration for nsxlib.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::certificates::{get_client_cert_provider, CertificateSource, ClientCertProvider};
use crate::config::{AppConfig, NsxV3Config};
use crate::errors::Result;
use crate::secrets::SecretString;

/// Tag scope of the Neutron ID on NSX objects created by the plugin.
pub const OS_NEUTRON_ID_SCOPE: &str = "os-neutron-id";

/// Default tag value identifying the plugin.
pub const NSX_NEUTRON_PLUGIN: &str = "NSX Neutron plugin";

/// Connection settings consumed by the nsxlib client.
#[derive(Debug, Clone)]
pub struct NsxLibConfig {
    pub username: String,
    pub password: SecretString,
    /// `None` means basic auth
    pub client_cert_provider: Option<Arc<dyn ClientCertProvider>>,
    /// HTTP level retries of a single request
    pub retries: u32,
    pub insecure: bool,
    pub ca_file: Option<PathBuf>,
    pub concurrent_connections: u32,
    pub http_timeout: u64,
    pub http_read_timeout: u64,
    pub conn_idle_timeout: u64,
    /// Attempts across managers before giving up
    pub max_attempts: u32,
    pub nsx_api_managers: Vec<String>,
    pub plugin_scope: String,
    pub plugin_tag: String,
    pub plugin_ver: String,
    pub dns_nameservers: Vec<String>,
    pub dns_domain: String,
}

/// Per-connection overrides of the configured credentials.
#[derive(Debug, Clone, Default)]
pub struct BackendCredentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Use basic auth even when a client certificate is configured
    pub basic_auth: bool,
}

impl BackendCredentials {
    pub fn basic(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self { username: Some(username.into()), password: Some(password.into()), basic_auth: true }
    }
}

/// Assemble the nsxlib configuration from settings and the selected provider.
///
/// Empty override values fall back to the configured ones. The provider is
/// dropped when `credentials.basic_auth` is set.
pub fn build_nsxlib_config(
    settings: &NsxV3Config,
    provider: Option<Arc<dyn ClientCertProvider>>,
    credentials: BackendCredentials,
) -> NsxLibConfig {
    let username = credentials
        .username
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| settings.nsx_api_user.clone());
    let password = credentials
        .password
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| settings.nsx_api_password.clone());
    let client_cert_provider = if credentials.basic_auth { None } else { provider };

    debug!(
        username = %username,
        managers = settings.nsx_api_managers.len(),
        client_cert = client_cert_provider.is_some(),
        "Building nsxlib configuration"
    );

    NsxLibConfig {
        username,
        password,
        client_cert_provider,
        retries: settings.http_retries,
        insecure: settings.insecure,
        ca_file: settings.ca_file.clone(),
        concurrent_connections: settings.concurrent_connections,
        http_timeout: settings.http_timeout,
        http_read_timeout: settings.http_read_timeout,
        conn_idle_timeout: settings.conn_idle_timeout,
        max_attempts: settings.retries,
        nsx_api_managers: settings.nsx_api_managers.clone(),
        plugin_scope: OS_NEUTRON_ID_SCOPE.to_string(),
        plugin_tag: NSX_NEUTRON_PLUGIN.to_string(),
        plugin_ver: crate::VERSION.to_string(),
        dns_nameservers: settings.nameservers.clone(),
        dns_domain: settings.dns_domain.clone(),
    }
}

/// Select the certificate provider from `config.client_auth` and build the
/// nsxlib configuration around it.
pub fn get_nsxlib_config(
    config: &AppConfig,
    source: Option<Arc<dyn CertificateSource>>,
    credentials: BackendCredentials,
) -> Result<NsxLibConfig> {
    let provider = if credentials.basic_auth {
        None
    } else {
        get_client_cert_provider(&config.client_auth, source)?
    };
    Ok(build_nsxlib_config(&config.nsx_v3, provider, credentials))
}
