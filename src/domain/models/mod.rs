pub mod config;
pub mod de;
pub mod log_config;
pub mod secret;

pub use config::{
    AdminStatus, AutoPkgSettings, CommonSettings, GitSettings, JamfProEnvironment, ReloadPolicy,
    Section, ServerSettings, ServiceSettings, SlackSettings, JAMF_PRO_PREFIX,
};
pub use log_config::{
    ConsoleStream, FormatStyle, FormatterConfig, HandlerConfig, LogConfig, LogLevel,
    LoggerConfig, RotationInterval,
};
pub use secret::{SecretString, REDACTED};
