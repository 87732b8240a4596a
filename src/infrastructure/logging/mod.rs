//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Handlers and loggers built from `PkgBot.log_config`
//! - Size-based and time-based log rotation
//! - Secret scrubbing on every output

pub mod logger;
pub mod rotation;
pub mod secret_scrubbing;

pub use logger::LoggerImpl;
pub use rotation::RotatingFileWriter;
pub use secret_scrubbing::{RedactingMakeWriter, SecretScrubber, SharedScrubber};
