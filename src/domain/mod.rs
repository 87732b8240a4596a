//! Domain layer for the PkgBot settings document
//!
//! Section models, the logging configuration model, secret values and the
//! error taxonomy. Nothing here touches the filesystem.

pub mod errors;
pub mod models;

pub use errors::{ConfigError, CredentialError};
