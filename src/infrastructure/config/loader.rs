use chrono::Utc;
use figment::providers::{Env, Format, Yaml};
use figment::value::{Dict, Tag, Value};
use figment::Figment;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::settings::Settings;
use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::config::SECTION_NAMES;
use crate::domain::models::log_config::{
    HandlerConfig, FORMATTER_KEYS, LOGGER_KEYS, LOG_CONFIG_KEYS,
};
use crate::domain::models::{
    AutoPkgSettings, CommonSettings, GitSettings, JamfProEnvironment, Section, ServerSettings,
    ServiceSettings, SlackSettings, JAMF_PRO_PREFIX,
};
use crate::infrastructure::logging::SecretScrubber;

/// Prefix of environment variable overrides, e.g. `PKGBOT_PkgBot__port=8443`
pub const ENV_PREFIX: &str = "PKGBOT_";

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "PKGBOT_CONFIG";

/// Settings file used when neither a path nor `PKGBOT_CONFIG` is given
pub const DEFAULT_CONFIG_PATH: &str = "settings/pkgbot_config.yaml";

const MAX_TOKEN_MINUTES: i128 = 525_600;
const MAX_START_INTERVAL_SECS: i128 = 31_536_000;
const MAX_BACKUP_COUNT: i128 = 10_000;

/// Loads and validates the PkgBot settings document
pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the settings path: explicit path > `PKGBOT_CONFIG` > default
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    /// Load from the resolved path with environment overrides
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Settings> {
        Self::load_from_file(Self::resolve_path(explicit))
    }

    /// Load configuration from a specific file
    ///
    /// Precedence (lowest to highest):
    /// 1. Documented defaults of each field
    /// 2. The YAML document at `path`
    /// 3. Environment variables (`PKGBOT_<Section>__<key>`, case preserved)
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Settings> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let figment = Self::document(&raw)?.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .filter(|key| key.as_str() != "CONFIG")
                .split("__"),
        );

        let settings = Self::build(&figment, Some(path.to_path_buf()))?;
        info!(
            path = %path.display(),
            environments = ?settings.jamf_pro_names(),
            unknown_keys = settings.unknown_keys().len(),
            "configuration loaded"
        );
        Ok(settings)
    }

    /// Load from an in-memory document, without environment overrides
    pub fn load_from_str(raw: &str) -> ConfigResult<Settings> {
        let figment = Self::document(raw)?;
        Self::build(&figment, None)
    }

    /// Syntax check, then wrap the document in a figment.
    fn document(raw: &str) -> ConfigResult<Figment> {
        let parsed: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| {
            let location = e.location();
            ConfigError::Parse {
                line: location.as_ref().map(serde_yaml::Location::line),
                column: location.as_ref().map(serde_yaml::Location::column),
                message: e.to_string(),
            }
        })?;

        match parsed {
            serde_yaml::Value::Null => Ok(Figment::new()),
            serde_yaml::Value::Mapping(_) => Ok(Figment::from(Yaml::string(raw))),
            _ => Err(ConfigError::Parse {
                line: Some(1),
                column: Some(1),
                message: "the settings document must be a mapping of sections".to_string(),
            }),
        }
    }

    fn build(figment: &Figment, source: Option<PathBuf>) -> ConfigResult<Settings> {
        let document: Dict = figment.extract().map_err(|e| figment_error(None, &e))?;
        let mut unknown_keys = Vec::new();

        check_scalars(&document)?;

        let autopkg: AutoPkgSettings = section(&document, &mut unknown_keys)?;
        let git: GitSettings = section(&document, &mut unknown_keys)?;
        let services: ServiceSettings = section(&document, &mut unknown_keys)?;
        let slack: SlackSettings = section(&document, &mut unknown_keys)?;
        let server: ServerSettings = section(&document, &mut unknown_keys)?;
        let common: CommonSettings = section(&document, &mut unknown_keys)?;

        let mut jamf_pro = BTreeMap::new();
        for (key, value) in &document {
            if let Some(name) = key.strip_prefix(JAMF_PRO_PREFIX) {
                if name.is_empty() {
                    return Err(ConfigError::validation(
                        key.as_str(),
                        "environment name missing after 'JamfPro_'",
                    ));
                }
                let env: JamfProEnvironment =
                    parse_section(key, value, JamfProEnvironment::KEYS, &mut unknown_keys)?;
                jamf_pro.insert(name.to_string(), env);
            } else if !SECTION_NAMES.contains(&key.as_str()) {
                unknown_keys.push(key.clone());
            }
        }

        if let Some(Value::Dict(_, log_config)) = document
            .get(ServerSettings::SECTION)
            .and_then(|server| server.find_ref("log_config"))
        {
            let prefix = format!("{}.log_config", ServerSettings::SECTION);
            log_config_unknown_keys(log_config, &prefix, &mut unknown_keys);
        }

        for key in &unknown_keys {
            warn!(key = %key, "ignoring unknown configuration key");
        }

        Self::validate(&jamf_pro, &server, &common)?;

        let scrubber = build_scrubber(&jamf_pro, &git, &slack, &common)?;
        debug!(
            redacted_values = scrubber.literal_count(),
            "secret scrubber ready"
        );

        Ok(Settings {
            autopkg,
            jamf_pro,
            git,
            services,
            slack,
            server,
            common,
            scrubber: Arc::new(scrubber),
            unknown_keys,
            document,
            source,
            loaded_at: Utc::now(),
        })
    }

    /// Validate relationships and values the types cannot express
    pub fn validate(
        jamf_pro: &BTreeMap<String, JamfProEnvironment>,
        server: &ServerSettings,
        common: &CommonSettings,
    ) -> ConfigResult<()> {
        for (name, env) in jamf_pro {
            let key = format!("{JAMF_PRO_PREFIX}{name}.jps_url");
            match &env.jps_url {
                None => {
                    return Err(ConfigError::validation(key, "required for every Jamf Pro environment"));
                }
                Some(url) if !matches!(url.scheme(), "http" | "https") => {
                    return Err(ConfigError::validation(
                        key,
                        format!("unsupported scheme '{}', expected http or https", url.scheme()),
                    ));
                }
                Some(_) => {}
            }
        }

        if server.host.trim().is_empty() {
            return Err(ConfigError::validation("PkgBot.host", "cannot be empty"));
        }

        if server.port == 0 {
            return Err(ConfigError::validation("PkgBot.port", "must be between 1 and 65535"));
        }

        if server.token_valid_for == 0 {
            return Err(ConfigError::validation(
                "PkgBot.token_valid_for",
                "must be at least 1 minute",
            ));
        }

        match (&server.ssl_keyfile, &server.ssl_certfile) {
            (Some(_), None) => {
                return Err(ConfigError::validation(
                    "PkgBot.ssl_certfile",
                    "required when ssl_keyfile is set",
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::validation(
                    "PkgBot.ssl_keyfile",
                    "required when ssl_certfile is set",
                ));
            }
            _ => {}
        }

        server
            .log_config
            .check_references()
            .map_err(|(key, reason)| ConfigError::validation(format!("PkgBot.{key}"), reason))?;

        if let Some(pattern) = common.redaction_strings.as_deref().filter(|p| !p.is_empty()) {
            let regex = Regex::new(pattern).map_err(|e| {
                ConfigError::validation("Common.RedactionStrings", format!("invalid pattern: {e}"))
            })?;
            if regex.is_match("") {
                return Err(ConfigError::validation(
                    "Common.RedactionStrings",
                    "pattern matches the empty string",
                ));
            }
        }

        Ok(())
    }
}

/// Deserialize a named section, or its defaults when absent.
fn section<T>(document: &Dict, unknown_keys: &mut Vec<String>) -> ConfigResult<T>
where
    T: Section + DeserializeOwned + Default,
{
    match document.get(T::SECTION) {
        None => Ok(T::default()),
        Some(value) => parse_section(T::SECTION, value, T::KEYS, unknown_keys),
    }
}

fn parse_section<T: DeserializeOwned>(
    name: &str,
    value: &Value,
    keys: &[&str],
    unknown_keys: &mut Vec<String>,
) -> ConfigResult<T> {
    // `Section:` with nothing under it
    if let Value::Empty(..) = value {
        let empty = Value::Dict(Tag::Default, Dict::new());
        return empty.deserialize().map_err(|e| figment_error(Some(name), &e));
    }

    if let Some(dict) = value.as_dict() {
        unknown_keys.extend(
            dict.keys()
                .filter(|k| !keys.contains(&k.as_str()))
                .map(|k| format!("{name}.{k}")),
        );
    }

    value.deserialize().map_err(|e| figment_error(Some(name), &e))
}

fn figment_error(section: Option<&str>, error: &figment::Error) -> ConfigError {
    let mut path: Vec<&str> = section.into_iter().collect();
    path.extend(
        error
            .path
            .iter()
            .map(String::as_str)
            .skip_while(|p| Some(*p) == section),
    );
    let key = if path.is_empty() {
        "<document>".to_string()
    } else {
        path.join(".")
    };
    ConfigError::validation(key, error.kind.to_string())
}

/// Integer and boolean checks on the raw document, so range and type
/// problems name the exact key.
fn check_scalars(document: &Dict) -> ConfigResult<()> {
    let server = document.get(ServerSettings::SECTION);
    check_int(server, "PkgBot.port", "port", 1, i128::from(u16::MAX))?;
    check_int(
        server,
        "PkgBot.token_valid_for",
        "token_valid_for",
        1,
        MAX_TOKEN_MINUTES,
    )?;
    check_bool(server, "PkgBot.keep_alive", "keep_alive")?;

    check_int(
        document.get(ServiceSettings::SECTION),
        "Services.autopkg_service_LaunchAgent_start_interval",
        "autopkg_service_LaunchAgent_start_interval",
        1,
        MAX_START_INTERVAL_SECS,
    )?;

    check_bool(
        document.get(AutoPkgSettings::SECTION),
        "AutoPkg.UseTrustInfo",
        "UseTrustInfo",
    )?;

    for (key, value) in document {
        if key.starts_with(JAMF_PRO_PREFIX) {
            check_bool(Some(value), &format!("{key}.verify_ssl"), "verify_ssl")?;
        }
    }

    let handlers = server
        .and_then(|s| s.find_ref("log_config"))
        .and_then(|l| l.find_ref("handlers"))
        .and_then(Value::as_dict);
    for (name, handler) in handlers.into_iter().flatten() {
        for field in ["max_bytes", "maxBytes"] {
            check_int(
                Some(handler),
                &format!("PkgBot.log_config.handlers.{name}.{field}"),
                field,
                0,
                i128::from(u64::MAX),
            )?;
        }
        for field in ["backup_count", "backupCount"] {
            check_int(
                Some(handler),
                &format!("PkgBot.log_config.handlers.{name}.{field}"),
                field,
                0,
                MAX_BACKUP_COUNT,
            )?;
        }
    }

    Ok(())
}

fn field<'a>(section: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    section?.as_dict()?.get(name)
}

fn check_int(
    section: Option<&Value>,
    key: &str,
    name: &str,
    min: i128,
    max: i128,
) -> ConfigResult<()> {
    match field(section, name) {
        None | Some(Value::Empty(..)) => Ok(()),
        Some(value) => match value.to_num().and_then(|n| {
            n.to_i128()
                .or_else(|| n.to_u128().and_then(|u| i128::try_from(u).ok()))
        }) {
            Some(n) if (min..=max).contains(&n) => Ok(()),
            Some(n) => Err(ConfigError::validation(
                key,
                format!("{n} is out of range, must be between {min} and {max}"),
            )),
            None => Err(ConfigError::validation(key, "must be an integer")),
        },
    }
}

/// Collect keys at any depth of `log_config` that the logging setup ignores.
fn log_config_unknown_keys(log_config: &Dict, prefix: &str, unknown: &mut Vec<String>) {
    fn extra(dict: &Dict, known: &[&str], path: &str, unknown: &mut Vec<String>) {
        unknown.extend(
            dict.keys()
                .filter(|k| !known.contains(&k.as_str()))
                .map(|k| format!("{path}.{k}")),
        );
    }

    fn each_entry<'a>(
        log_config: &'a Dict,
        group: &str,
    ) -> impl Iterator<Item = (&'a String, &'a Dict)> {
        log_config
            .get(group)
            .and_then(Value::as_dict)
            .into_iter()
            .flatten()
            .filter_map(|(name, value)| value.as_dict().map(|dict| (name, dict)))
    }

    extra(log_config, LOG_CONFIG_KEYS, prefix, unknown);

    for (name, formatter) in each_entry(log_config, "formatters") {
        extra(formatter, FORMATTER_KEYS, &format!("{prefix}.formatters.{name}"), unknown);
    }

    for (name, handler) in each_entry(log_config, "handlers") {
        let known = handler
            .get("class")
            .and_then(Value::as_str)
            .and_then(HandlerConfig::keys_for_class);
        if let Some(known) = known {
            extra(handler, known, &format!("{prefix}.handlers.{name}"), unknown);
        }
    }

    for (name, logger) in each_entry(log_config, "loggers") {
        extra(logger, LOGGER_KEYS, &format!("{prefix}.loggers.{name}"), unknown);
    }

    if let Some(root) = log_config.get("root").and_then(Value::as_dict) {
        extra(root, LOGGER_KEYS, &format!("{prefix}.root"), unknown);
    }
}

fn check_bool(section: Option<&Value>, key: &str, name: &str) -> ConfigResult<()> {
    match field(section, name) {
        None | Some(Value::Empty(..) | Value::Bool(..)) => Ok(()),
        Some(_) => Err(ConfigError::validation(key, "must be a boolean (true or false)")),
    }
}

fn build_scrubber(
    jamf_pro: &BTreeMap<String, JamfProEnvironment>,
    git: &GitSettings,
    slack: &SlackSettings,
    common: &CommonSettings,
) -> ConfigResult<SecretScrubber> {
    let mut literals: Vec<&str> = Vec::new();
    for env in jamf_pro.values() {
        literals.extend([
            env.api_user.as_str(),
            env.api_password.expose(),
            env.dp1_user.as_str(),
            env.dp1_password.expose(),
        ]);
    }
    literals.extend([
        slack.signing_secret.expose(),
        slack.bot_token.expose(),
        git.ssh_private_key.expose(),
    ]);

    SecretScrubber::new(literals, common.redaction_strings.as_deref()).map_err(|e| {
        ConfigError::validation(
            "Common.RedactionStrings",
            format!("cannot build redaction pattern: {e}"),
        )
    })
}
