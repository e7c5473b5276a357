//! Error types for client certificate provisioning.

use thiserror::Error;

/// Result type for certificate operations.
pub type Result<T> = std::result::Result<T, CertificateError>;

/// Errors that can occur while materializing or loading a client certificate.
#[derive(Error, Debug)]
pub enum CertificateError {
    /// The certificate source has no certificate for the identity.
    #[error("Unable to load client certificate '{identity}' from nsx-db")]
    Unavailable { identity: String },

    /// Directory creation, file write or removal failed.
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored or supplied material is not a usable certificate.
    #[error("Invalid client certificate: {reason}")]
    InvalidCertificate { reason: String },

    /// The certificate store itself failed (database unreachable, etc.).
    #[error("Certificate storage error: {message}")]
    Storage { message: String },
}

impl CertificateError {
    /// Create an unavailable error.
    pub fn unavailable(identity: impl Into<String>) -> Self {
        Self::Unavailable { identity: identity.into() }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create an invalid certificate error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCertificate { reason: reason.into() }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }
}
