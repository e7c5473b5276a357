//! # Client Certificates
//!
//! Client certificate handling for mutual-TLS connections to NSX managers.
//!
//! Two modes are supported, chosen by `client_auth.storage`:
//! - `nsx-db`: the certificate lives in the `client_certificates` table and is
//!   written to a short-lived file while a connection needs it
//!   ([`DbCertProvider`]);
//! - `none`: the admin supplies a certificate file that is used as is
//!   ([`StaticCertProvider`]).
//!
//! ```rust,ignore
//! let provider = get_client_cert_provider(&config.client_auth, Some(source))?;
//! if let Some(provider) = provider {
//!     let scope = provider.acquire().await?;
//!     tls.client_cert_file(scope.path());
//! } // file removed here for nsx-db
//! ```

pub mod error;
pub mod mock;
pub mod provider;
pub mod record;
pub mod scoped;
pub mod source;

pub use error::CertificateError;
pub use mock::MockCertificateSource;
pub use provider::{get_client_cert_provider, CertificateScope, ClientCertProvider, StaticCertProvider};
pub use record::{
    generate_self_signed, inspect_certificate, CertificateInfo, CertificateRecord,
    NSX_OPENSTACK_IDENTITY,
};
pub use scoped::{DbCertProvider, DEFAULT_EXPIRATION_ALERT_DAYS};
pub use source::{CertificateSource, DbCertificateSource};
