//! CLI command implementations.

pub mod check;
pub mod get;
pub mod redact;
pub mod show;
pub mod watch;
