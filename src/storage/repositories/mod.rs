//! Repository modules for data access

pub mod client_certificate;
pub mod qos_policy_mapping;

pub use client_certificate::{ClientCertificateRepository, SqlxClientCertificateRepository};
pub use qos_policy_mapping::{QosPolicyMappingRepository, SqlxQosPolicyMappingRepository};
