use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::de::{blank_string, default_true, false_unless_set, null_as_default, true_unless_set};
use super::log_config::LogConfig;
use super::secret::{SecretString, REDACTED};

/// Prefix of the top-level keys holding one Jamf Pro environment each.
pub const JAMF_PRO_PREFIX: &str = "JamfPro_";

/// Top-level section names other than the Jamf Pro environments.
pub const SECTION_NAMES: &[&str] = &[
    AutoPkgSettings::SECTION,
    GitSettings::SECTION,
    ServiceSettings::SECTION,
    SlackSettings::SECTION,
    ServerSettings::SECTION,
    CommonSettings::SECTION,
];

/// A named block of the settings document and the keys it understands.
pub trait Section {
    /// Top-level key of the section
    const SECTION: &'static str;
    /// Keys recognised inside the section
    const KEYS: &'static [&'static str];
}

/// AutoPkg runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPkgSettings {
    /// Path to the `autopkg` binary
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Verify recipe trust info before running
    #[serde(
        rename = "UseTrustInfo",
        default = "default_true",
        deserialize_with = "true_unless_set"
    )]
    pub use_trust_info: bool,

    /// Directory holding recipe overrides
    #[serde(rename = "RecipeOverrides", default)]
    pub recipe_overrides: Option<PathBuf>,
}

impl Section for AutoPkgSettings {
    const SECTION: &'static str = "AutoPkg";
    const KEYS: &'static [&'static str] = &["binary", "UseTrustInfo", "RecipeOverrides"];
}

impl Default for AutoPkgSettings {
    fn default() -> Self {
        Self {
            binary: None,
            use_trust_info: true,
            recipe_overrides: None,
        }
    }
}

/// One Jamf Pro environment (`JamfPro_Dev`, `JamfPro_Prod`, …)
///
/// `Debug` masks the account names along with the passwords.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JamfProEnvironment {
    /// AutoPkg preferences file used when running against this environment
    #[serde(default)]
    pub autopkg_prefs: Option<PathBuf>,

    /// Jamf Pro server URL; required for every environment
    #[serde(default)]
    pub jps_url: Option<url::Url>,

    #[serde(default = "default_true", deserialize_with = "true_unless_set")]
    pub verify_ssl: bool,

    #[serde(default, deserialize_with = "blank_string")]
    pub api_user: String,

    #[serde(default)]
    pub api_password: SecretString,

    /// Distribution point account
    #[serde(default, deserialize_with = "blank_string")]
    pub dp1_user: String,

    #[serde(default)]
    pub dp1_password: SecretString,

    /// Recipe identifier used when promoting packages into this environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_recipe: Option<String>,
}

/// Placeholder for a set account name; blank stays blank.
fn masked(value: &str) -> &str {
    if value.is_empty() {
        value
    } else {
        REDACTED
    }
}

impl fmt::Debug for JamfProEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JamfProEnvironment")
            .field("autopkg_prefs", &self.autopkg_prefs)
            .field("jps_url", &self.jps_url.as_ref().map(url::Url::as_str))
            .field("verify_ssl", &self.verify_ssl)
            .field("api_user", &masked(&self.api_user))
            .field("api_password", &self.api_password)
            .field("dp1_user", &masked(&self.dp1_user))
            .field("dp1_password", &self.dp1_password)
            .field("promotion_recipe", &self.promotion_recipe)
            .finish()
    }
}

impl Section for JamfProEnvironment {
    const SECTION: &'static str = JAMF_PRO_PREFIX;
    const KEYS: &'static [&'static str] = &[
        "autopkg_prefs",
        "jps_url",
        "verify_ssl",
        "api_user",
        "api_password",
        "dp1_user",
        "dp1_password",
        "promotion_recipe",
    ];
}

/// Git identity and transport for the recipe repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    #[serde(default)]
    pub binary: Option<PathBuf>,

    #[serde(default, deserialize_with = "blank_string")]
    pub user_name: String,

    #[serde(default, deserialize_with = "blank_string")]
    pub user_email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_repo: Option<String>,

    /// `ssh_config` block, kept verbatim
    #[serde(default, deserialize_with = "blank_string")]
    pub config_ssh: String,

    /// `known_hosts` lines
    #[serde(default, deserialize_with = "known_hosts")]
    pub known_hosts: Vec<String>,

    /// PEM key block, kept verbatim
    #[serde(default)]
    pub ssh_private_key: SecretString,
}

impl Section for GitSettings {
    const SECTION: &'static str = "Git";
    const KEYS: &'static [&'static str] = &[
        "binary",
        "user_name",
        "user_email",
        "remote_repo",
        "config_ssh",
        "known_hosts",
        "ssh_private_key",
    ];
}

/// `known_hosts` may be a list or a single multi-line block.
fn known_hosts<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hosts {
        List(Vec<String>),
        Block(String),
    }

    Ok(match Option::<Hosts>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Hosts::List(list)) => list,
        Some(Hosts::Block(block)) => block
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Background service units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Label of the unit running the web service
    #[serde(rename = "pkgbot_service_LaunchDaemon", default = "default_pkgbot_service")]
    pub pkgbot_service: String,

    /// Label of the unit running scheduled AutoPkg runs
    #[serde(rename = "autopkg_service_LaunchAgent", default = "default_autopkg_service")]
    pub autopkg_service: String,

    /// Seconds between scheduled AutoPkg runs
    #[serde(
        rename = "autopkg_service_LaunchAgent_start_interval",
        default = "default_start_interval"
    )]
    pub autopkg_service_start_interval: u64,
}

impl Section for ServiceSettings {
    const SECTION: &'static str = "Services";
    const KEYS: &'static [&'static str] = &[
        "pkgbot_service_LaunchDaemon",
        "autopkg_service_LaunchAgent",
        "autopkg_service_LaunchAgent_start_interval",
    ];
}

fn default_pkgbot_service() -> String {
    "com.github.pkgbot.service".to_string()
}

fn default_autopkg_service() -> String {
    "com.github.pkgbot.autopkg".to_string()
}

const fn default_start_interval() -> u64 {
    86_400
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            pkgbot_service: default_pkgbot_service(),
            autopkg_service: default_autopkg_service(),
            autopkg_service_start_interval: default_start_interval(),
        }
    }
}

/// Slack bot integration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default)]
    pub signing_secret: SecretString,

    #[serde(default)]
    pub bot_token: SecretString,

    #[serde(default, deserialize_with = "blank_string")]
    pub bot_name: String,

    #[serde(default, deserialize_with = "blank_string")]
    pub bot_id: String,

    #[serde(default, deserialize_with = "blank_string")]
    pub channel: String,
}

impl Section for SlackSettings {
    const SECTION: &'static str = "Slack";
    const KEYS: &'static [&'static str] =
        &["signing_secret", "bot_token", "bot_name", "bot_id", "channel"];
}

/// What an explicit reload request does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Re-read the document and swap in a new snapshot
    #[default]
    Swap,
    /// Refuse; changes take effect on the next process start
    Restart,
}

/// Whether a user is an administrator and where to reach them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus<'a> {
    NotAdmin,
    /// `chat_id` is `None` when the mapping is explicitly null
    Admin { chat_id: Option<&'a str> },
}

/// Web service settings (`PkgBot` section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host", deserialize_with = "blank_string")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_keyfile: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_certfile: Option<PathBuf>,

    /// Auto-reload flag handed to the web server
    #[serde(default, deserialize_with = "false_unless_set")]
    pub keep_alive: bool,

    #[serde(default)]
    pub reload_policy: ReloadPolicy,

    /// Username → chat identifier; null means no chat identifier
    #[serde(rename = "Admins", default, deserialize_with = "null_as_default")]
    pub admins: BTreeMap<String, Option<String>>,

    /// Template directory
    #[serde(default)]
    pub jinja_templates: Option<PathBuf>,

    /// Access token lifetime in minutes
    #[serde(default = "default_token_valid_for")]
    pub token_valid_for: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub log_config: LogConfig,
}

impl Section for ServerSettings {
    const SECTION: &'static str = "PkgBot";
    const KEYS: &'static [&'static str] = &[
        "host",
        "port",
        "ssl_keyfile",
        "ssl_certfile",
        "keep_alive",
        "reload_policy",
        "Admins",
        "jinja_templates",
        "token_valid_for",
        "log_config",
    ];
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_token_valid_for() -> u32 {
    30
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ssl_keyfile: None,
            ssl_certfile: None,
            keep_alive: false,
            reload_policy: ReloadPolicy::default(),
            admins: BTreeMap::new(),
            jinja_templates: None,
            token_valid_for: default_token_valid_for(),
            log_config: LogConfig::default(),
        }
    }
}

impl ServerSettings {
    pub fn admin(&self, username: &str) -> AdminStatus<'_> {
        match self.admins.get(username) {
            None => AdminStatus::NotAdmin,
            Some(chat_id) => AdminStatus::Admin {
                chat_id: chat_id.as_deref(),
            },
        }
    }

    pub const fn uses_tls(&self) -> bool {
        self.ssl_keyfile.is_some() && self.ssl_certfile.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings shared by every component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonSettings {
    /// Extra pattern of strings to redact from notifications and logs
    #[serde(rename = "RedactionStrings", default)]
    pub redaction_strings: Option<String>,
}

impl Section for CommonSettings {
    const SECTION: &'static str = "Common";
    const KEYS: &'static [&'static str] = &["RedactionStrings"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autopkg_defaults() {
        let settings: AutoPkgSettings = serde_yaml::from_str("binary: /usr/local/bin/autopkg").unwrap();
        assert!(settings.use_trust_info);
        assert_eq!(
            settings.binary.as_deref(),
            Some(std::path::Path::new("/usr/local/bin/autopkg"))
        );
    }

    #[test]
    fn test_jamf_environment_blank_credentials() {
        let yaml = "jps_url: https://jps.example.com:8443\napi_user:\napi_password:\n";
        let env: JamfProEnvironment = serde_yaml::from_str(yaml).unwrap();
        assert!(env.verify_ssl);
        assert!(env.api_user.is_empty());
        assert!(env.api_password.is_blank());
        assert_eq!(env.jps_url.unwrap().host_str(), Some("jps.example.com"));
    }

    #[test]
    fn test_jamf_environment_debug_masks_accounts() {
        let yaml = "api_user: svc-pkgbot\napi_password: pw-0001\ndp1_user: dp-reader\ndp1_password: pw-0002\n";
        let env: JamfProEnvironment = serde_yaml::from_str(yaml).unwrap();
        let debug = format!("{env:?}");

        for value in ["svc-pkgbot", "pw-0001", "dp-reader", "pw-0002"] {
            assert!(!debug.contains(value), "{value} leaked in {debug}");
        }
        assert!(debug.contains("api_user: \"<redacted>\""));

        let blank: JamfProEnvironment = serde_yaml::from_str("api_user:\n").unwrap();
        assert!(format!("{blank:?}").contains("api_user: \"\""));
    }

    #[test]
    fn test_empty_admins_and_log_config() {
        let server: ServerSettings = serde_yaml::from_str("Admins:\nlog_config:\n").unwrap();
        assert!(server.admins.is_empty());
        assert_eq!(server.log_config, LogConfig::default());
        assert_eq!(server.admin("alice"), AdminStatus::NotAdmin);
    }

    #[test]
    fn test_admin_lookup() {
        let yaml = "Admins:\n  alice: U012ABCDEF\n  bob:\n";
        let server: ServerSettings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            server.admin("alice"),
            AdminStatus::Admin {
                chat_id: Some("U012ABCDEF")
            }
        );
        assert_eq!(server.admin("bob"), AdminStatus::Admin { chat_id: None });
        assert_eq!(server.admin("mallory"), AdminStatus::NotAdmin);
    }

    #[test]
    fn test_known_hosts_block_or_list() {
        let block: GitSettings =
            serde_yaml::from_str("known_hosts: |\n  github.com ssh-ed25519 AAAA\n  gitlab.com ssh-rsa BBBB\n")
                .unwrap();
        assert_eq!(block.known_hosts.len(), 2);

        let list: GitSettings =
            serde_yaml::from_str("known_hosts:\n  - github.com ssh-ed25519 AAAA\n").unwrap();
        assert_eq!(list.known_hosts, vec!["github.com ssh-ed25519 AAAA".to_string()]);
    }

    #[test]
    fn test_server_defaults() {
        let server = ServerSettings::default();
        assert_eq!(server.bind_address(), "127.0.0.1:8000");
        assert!(!server.uses_tls());
        assert_eq!(server.reload_policy, ReloadPolicy::Swap);
    }
}
