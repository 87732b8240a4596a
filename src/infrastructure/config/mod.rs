//! Settings loading
//!
//! Hierarchical configuration using figment:
//! - YAML document (`settings/pkgbot_config.yaml` by default)
//! - Environment variable overrides (`PKGBOT_<Section>__<key>`)
//! - Validation with errors naming the offending key
//! - Shared snapshots with explicit reload

pub mod handle;
pub mod loader;
pub mod settings;

pub use handle::ConfigHandle;
pub use loader::{ConfigLoader, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use settings::Settings;
