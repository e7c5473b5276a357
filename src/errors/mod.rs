//! # Error Handling
//!
//! Error types for the NSX plugin glue. Certificate provisioning has its own
//! error enum in [`crate::certificates`]; it converts into [`NsxError`].

pub mod types;

pub use types::{NsxError, Result};
