//! PkgBot configuration
//!
//! Loads the single YAML settings document that drives PkgBot: the AutoPkg
//! runner, each Jamf Pro environment, Git, the background services, Slack
//! and the web service itself.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Section models, secrets, error taxonomy
//! - **Infrastructure Layer** (`infrastructure`): Loader, logging, credentials
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use pkgbot_config::ConfigHandle;
//!
//! let handle = ConfigHandle::load(None)?;
//! let settings = handle.snapshot();
//! println!("listening on {}", settings.server().bind_address());
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::errors::{ConfigError, ConfigResult, CredentialError};
pub use domain::models::{
    AdminStatus, AutoPkgSettings, CommonSettings, GitSettings, JamfProEnvironment, LogConfig,
    ReloadPolicy, SecretString, ServerSettings, ServiceSettings, SlackSettings,
};
pub use infrastructure::config::{ConfigHandle, ConfigLoader, Settings};
pub use infrastructure::credentials::ApiCredentials;
pub use infrastructure::logging::{LoggerImpl, SecretScrubber, SharedScrubber};
