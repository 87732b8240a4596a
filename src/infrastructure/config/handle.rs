use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use super::loader::ConfigLoader;
use super::settings::Settings;
use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::ReloadPolicy;
use crate::infrastructure::logging::SharedScrubber;

/// Shared access to the current settings.
///
/// Readers take a snapshot and keep it as long as they like; a reload
/// replaces the snapshot for later readers without touching earlier ones.
/// The scrubber used by the log writers is swapped along with it.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<Settings>>>,
    scrubber: SharedScrubber,
}

impl ConfigHandle {
    pub fn new(settings: Settings) -> Self {
        let scrubber = SharedScrubber::new(settings.scrubber());
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
            scrubber,
        }
    }

    /// Load from the resolved path and wrap the result.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        ConfigLoader::load(path).map(Self::new)
    }

    /// The settings currently in effect.
    pub fn snapshot(&self) -> Arc<Settings> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Scrubber for log writers; follows every successful reload.
    pub fn scrubber(&self) -> SharedScrubber {
        self.scrubber.clone()
    }

    /// Re-read the source document.
    ///
    /// With `reload_policy: restart` this fails with
    /// [`ConfigError::ReloadRequiresRestart`]. Settings built from a string
    /// have no source and are returned unchanged. A document that fails to
    /// load leaves the current snapshot in place.
    pub fn reload(&self) -> ConfigResult<Arc<Settings>> {
        let current = self.snapshot();

        if current.server().reload_policy == ReloadPolicy::Restart {
            warn!("reload refused, reload_policy is 'restart'");
            return Err(ConfigError::ReloadRequiresRestart);
        }

        let Some(path) = current.source().map(Path::to_path_buf) else {
            return Ok(current);
        };

        self.reload_from(&path)
    }

    fn reload_from(&self, path: &Path) -> ConfigResult<Arc<Settings>> {
        let fresh = Arc::new(ConfigLoader::load_from_file(path)?);

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::clone(&fresh);
        self.scrubber.replace(fresh.scrubber());
        drop(guard);

        info!(path = %path.display(), "configuration reloaded");
        Ok(fresh)
    }
}
