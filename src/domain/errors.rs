//! Errors for loading settings and using the credentials they carry.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error{}: {message}", format_location(.line, .column))]
    Parse {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Configuration validation error at '{key}': {reason}")]
    Validation { key: String, reason: String },

    #[error("Reload requested but reload_policy is 'restart'; restart the service to apply changes")]
    ReloadRequiresRestart,
}

fn format_location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Dotted key named by a validation error.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Validation { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Raised by consumers when a secret they need was left blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Missing credential: {scope}.{field} is not set")]
    Missing { scope: String, field: &'static str },
}

impl CredentialError {
    pub fn missing(scope: impl Into<String>, field: &'static str) -> Self {
        Self::Missing {
            scope: scope.into(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_includes_location() {
        let err = ConfigError::Parse {
            line: Some(4),
            column: Some(7),
            message: "mapping values are not allowed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration parse error at line 4, column 7: mapping values are not allowed"
        );
    }

    #[test]
    fn test_validation_error_names_key() {
        let err = ConfigError::validation("PkgBot.port", "must be between 1 and 65535");
        assert_eq!(err.key(), Some("PkgBot.port"));
        assert!(err.to_string().contains("'PkgBot.port'"));
    }

    #[test]
    fn test_missing_credential_message() {
        let err = CredentialError::missing("JamfPro_Prod", "api_password");
        assert_eq!(
            err.to_string(),
            "Missing credential: JamfPro_Prod.api_password is not set"
        );
    }
}
