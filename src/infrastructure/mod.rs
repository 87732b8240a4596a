//! Infrastructure layer module
//!
//! Everything that touches the outside world:
//! - Settings loading, validation and reload
//! - Logging with secret redaction
//! - Credential access at the point of use

pub mod config;
pub mod credentials;
pub mod logging;
