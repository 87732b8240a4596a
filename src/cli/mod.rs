pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::{ConfigError, CredentialError};

/// Print `err` and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let key = err
        .downcast_ref::<ConfigError>()
        .and_then(ConfigError::key)
        .map(str::to_string);
    let kind = if err.is::<ConfigError>() {
        "configuration"
    } else if err.is::<CredentialError>() {
        "credential"
    } else {
        "error"
    };

    if json_mode {
        let body = serde_json::json!({
            "error": format!("{err:#}"),
            "kind": kind,
            "key": key,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
