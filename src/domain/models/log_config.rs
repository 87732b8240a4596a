//! Logging configuration carried in `PkgBot.log_config`.
//!
//! The document keeps the familiar formatters / handlers / loggers layout,
//! but every formatter and handler is one of a fixed set of kinds. Handler
//! `class` values written in the dotted `logging.handlers.*` style are
//! accepted as aliases of the native kind names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Keys recognised directly under `log_config`.
pub const LOG_CONFIG_KEYS: &[&str] = &[
    "version",
    "disable_existing_loggers",
    "formatters",
    "handlers",
    "loggers",
    "root",
];

/// Keys recognised inside one formatter.
pub const FORMATTER_KEYS: &[&str] = &["style", "datefmt", "include_target"];

/// Keys recognised inside one logger and inside `root`.
pub const LOGGER_KEYS: &[&str] = &["level", "handlers", "propagate"];

/// Severity threshold for handlers and loggers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOTSET" | "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" | "CRITICAL" | "FATAL" => Ok(Self::Error),
            "OFF" | "NONE" => Ok(Self::Off),
            _ => Err(format!(
                "invalid log level '{s}', expected one of TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL, OFF"
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Line layout produced by a formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    /// Single-line human readable text
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line human readable output
    Pretty,
}

/// Named formatter preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    #[serde(default)]
    pub style: FormatStyle,

    /// `strftime` pattern for timestamps (local time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datefmt: Option<String>,

    /// Include the event target (logger name)
    #[serde(default = "crate::domain::models::de::default_true")]
    pub include_target: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            style: FormatStyle::Text,
            datefmt: None,
            include_target: true,
        }
    }
}

/// Console output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    Stdout,
    #[default]
    Stderr,
}

/// Period for time-based rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationInterval {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

/// A log destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Write to stdout or stderr
    #[serde(alias = "logging.StreamHandler")]
    Console {
        #[serde(default)]
        level: Option<LogLevel>,
        #[serde(default)]
        formatter: Option<String>,
        #[serde(default)]
        stream: ConsoleStream,
    },

    /// Size-based rotation: `filename`, `filename.1` … `filename.<backup_count>`
    #[serde(alias = "logging.handlers.RotatingFileHandler")]
    RotatingFile {
        #[serde(default)]
        level: Option<LogLevel>,
        #[serde(default)]
        formatter: Option<String>,
        filename: PathBuf,
        /// Rotate once the file would exceed this many bytes; 0 never rotates
        #[serde(default, alias = "maxBytes")]
        max_bytes: u64,
        #[serde(default, alias = "backupCount")]
        backup_count: u32,
    },

    /// Time-based rotation, old files pruned beyond `backup_count`
    #[serde(alias = "logging.handlers.TimedRotatingFileHandler")]
    TimedRotatingFile {
        #[serde(default)]
        level: Option<LogLevel>,
        #[serde(default)]
        formatter: Option<String>,
        filename: PathBuf,
        #[serde(default)]
        when: RotationInterval,
        #[serde(default, alias = "backupCount")]
        backup_count: u32,
    },
}

impl HandlerConfig {
    /// Keys recognised inside a handler of the given `class`, `None` for an
    /// unknown class.
    pub fn keys_for_class(class: &str) -> Option<&'static [&'static str]> {
        match class {
            "console" | "logging.StreamHandler" => {
                Some(&["class", "level", "formatter", "stream"])
            }
            "rotating_file" | "logging.handlers.RotatingFileHandler" => Some(&[
                "class",
                "level",
                "formatter",
                "filename",
                "max_bytes",
                "maxBytes",
                "backup_count",
                "backupCount",
            ]),
            "timed_rotating_file" | "logging.handlers.TimedRotatingFileHandler" => Some(&[
                "class",
                "level",
                "formatter",
                "filename",
                "when",
                "backup_count",
                "backupCount",
            ]),
            _ => None,
        }
    }

    pub const fn level(&self) -> Option<LogLevel> {
        match self {
            Self::Console { level, .. }
            | Self::RotatingFile { level, .. }
            | Self::TimedRotatingFile { level, .. } => *level,
        }
    }

    pub fn formatter(&self) -> Option<&str> {
        match self {
            Self::Console { formatter, .. }
            | Self::RotatingFile { formatter, .. }
            | Self::TimedRotatingFile { formatter, .. } => formatter.as_deref(),
        }
    }

    /// Target file for file-backed handlers.
    pub fn filename(&self) -> Option<&PathBuf> {
        match self {
            Self::Console { .. } => None,
            Self::RotatingFile { filename, .. } | Self::TimedRotatingFile { filename, .. } => {
                Some(filename)
            }
        }
    }
}

/// Routing for one logger name (a tracing target prefix).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default, deserialize_with = "crate::domain::models::de::null_as_default")]
    pub handlers: Vec<String>,
    #[serde(default = "crate::domain::models::de::default_true")]
    pub propagate: bool,
}

/// Complete logging setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub disable_existing_loggers: bool,

    #[serde(default, deserialize_with = "crate::domain::models::de::null_as_default")]
    pub formatters: BTreeMap<String, FormatterConfig>,

    #[serde(default, deserialize_with = "crate::domain::models::de::null_as_default")]
    pub handlers: BTreeMap<String, HandlerConfig>,

    #[serde(default, deserialize_with = "crate::domain::models::de::null_as_default")]
    pub loggers: BTreeMap<String, LoggerConfig>,

    #[serde(default)]
    pub root: Option<LoggerConfig>,
}

const fn default_version() -> u32 {
    1
}

impl Default for LogConfig {
    /// Info-level text to stderr.
    fn default() -> Self {
        let mut handlers = BTreeMap::new();
        handlers.insert(
            "console".to_string(),
            HandlerConfig::Console {
                level: None,
                formatter: None,
                stream: ConsoleStream::Stderr,
            },
        );
        Self {
            version: default_version(),
            disable_existing_loggers: false,
            formatters: BTreeMap::new(),
            handlers,
            loggers: BTreeMap::new(),
            root: Some(LoggerConfig {
                level: Some(LogLevel::Info),
                handlers: vec!["console".to_string()],
                propagate: true,
            }),
        }
    }
}

impl LogConfig {
    /// Check cross references. Returns the offending key path and a reason.
    pub fn check_references(&self) -> Result<(), (String, String)> {
        for (name, handler) in &self.handlers {
            if let Some(formatter) = handler.formatter() {
                if !self.formatters.contains_key(formatter) {
                    return Err((
                        format!("log_config.handlers.{name}.formatter"),
                        format!("formatter '{formatter}' is not defined"),
                    ));
                }
            }
            if let Some(filename) = handler.filename() {
                if filename.as_os_str().is_empty() {
                    return Err((
                        format!("log_config.handlers.{name}.filename"),
                        "filename cannot be empty".to_string(),
                    ));
                }
            }
        }

        let routes = self
            .loggers
            .iter()
            .map(|(name, logger)| (format!("log_config.loggers.{name}.handlers"), logger))
            .chain(
                self.root
                    .iter()
                    .map(|root| ("log_config.root.handlers".to_string(), root)),
            );

        for (key, logger) in routes {
            for handler in &logger.handlers {
                if !self.handlers.contains_key(handler) {
                    return Err((key, format!("handler '{handler}' is not defined")));
                }
            }
        }

        Ok(())
    }
}
