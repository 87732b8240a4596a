//! The loaded, validated settings snapshot.

use chrono::{DateTime, Utc};
use figment::value::{Dict, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::{
    AutoPkgSettings, CommonSettings, GitSettings, JamfProEnvironment, ServerSettings,
    ServiceSettings, SlackSettings, JAMF_PRO_PREFIX,
};
use crate::infrastructure::logging::SecretScrubber;

/// Immutable settings built once by [`ConfigLoader`](super::ConfigLoader).
///
/// There are no setters; a reload produces a new `Settings`. Cloning is
/// cheap enough to hand a copy to each component, though most callers share
/// one through [`ConfigHandle`](super::ConfigHandle).
#[derive(Clone)]
pub struct Settings {
    pub(super) autopkg: AutoPkgSettings,
    pub(super) jamf_pro: BTreeMap<String, JamfProEnvironment>,
    pub(super) git: GitSettings,
    pub(super) services: ServiceSettings,
    pub(super) slack: SlackSettings,
    pub(super) server: ServerSettings,
    pub(super) common: CommonSettings,
    pub(super) scrubber: Arc<SecretScrubber>,
    pub(super) unknown_keys: Vec<String>,
    pub(super) document: Dict,
    pub(super) source: Option<PathBuf>,
    pub(super) loaded_at: DateTime<Utc>,
}

impl Settings {
    pub const fn autopkg(&self) -> &AutoPkgSettings {
        &self.autopkg
    }

    /// Jamf Pro environment by name (`"Prod"` for `JamfPro_Prod`).
    pub fn jamf_pro(&self, name: &str) -> Option<&JamfProEnvironment> {
        self.jamf_pro.get(name)
    }

    /// Like [`jamf_pro`](Self::jamf_pro), failing with the missing key.
    pub fn require_jamf_pro(&self, name: &str) -> ConfigResult<&JamfProEnvironment> {
        self.jamf_pro.get(name).ok_or_else(|| {
            ConfigError::validation(
                format!("{JAMF_PRO_PREFIX}{name}"),
                "environment is not defined",
            )
        })
    }

    pub fn jamf_pro_environments(&self) -> impl Iterator<Item = (&str, &JamfProEnvironment)> {
        self.jamf_pro.iter().map(|(name, env)| (name.as_str(), env))
    }

    pub fn jamf_pro_names(&self) -> Vec<&str> {
        self.jamf_pro.keys().map(String::as_str).collect()
    }

    pub const fn git(&self) -> &GitSettings {
        &self.git
    }

    pub const fn services(&self) -> &ServiceSettings {
        &self.services
    }

    pub const fn slack(&self) -> &SlackSettings {
        &self.slack
    }

    pub const fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub const fn common(&self) -> &CommonSettings {
        &self.common
    }

    /// Scrubber covering every configured secret plus `Common.RedactionStrings`.
    pub fn scrubber(&self) -> Arc<SecretScrubber> {
        Arc::clone(&self.scrubber)
    }

    /// Redact configured secrets from outbound text.
    pub fn redact(&self, message: &str) -> String {
        self.scrubber.redact(message).into_owned()
    }

    /// Redact configured secrets and whatever the call-site `patterns` match.
    ///
    /// # Errors
    /// Returns an error if one of `patterns` is not a valid regular expression.
    pub fn redact_with(&self, message: &str, patterns: &[&str]) -> Result<String, regex::Error> {
        self.scrubber.redact_with(message, patterns)
    }

    /// Dotted paths of keys the loader did not recognise.
    pub fn unknown_keys(&self) -> &[String] {
        &self.unknown_keys
    }

    /// File the settings were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Raw value at a dotted path such as `"JamfPro_Prod.jps_url"`.
    ///
    /// Values come from the merged document, secrets included; pass anything
    /// destined for output through [`redact`](Self::redact).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.document.get(head)?;
        match rest {
            Some(rest) if !rest.is_empty() => value.find_ref(rest),
            _ => Some(value),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("autopkg", &self.autopkg)
            .field("jamf_pro", &self.jamf_pro)
            .field("git", &self.git)
            .field("services", &self.services)
            .field("slack", &self.slack)
            .field("server", &self.server)
            .field("common", &self.common)
            .field("unknown_keys", &self.unknown_keys)
            .field("source", &self.source)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}
