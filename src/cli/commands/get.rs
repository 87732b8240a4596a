//! Implementation of the `pkgbot-config get` command.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::Path;

use crate::cli::output::{output, redact_value, to_yaml, CommandOutput};
use crate::infrastructure::config::{ConfigLoader, Settings};

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted key, e.g. `PkgBot.port`
    pub key: String,
}

#[derive(Debug, serde::Serialize)]
pub struct GetOutput {
    pub key: String,
    pub value: Value,
}

impl CommandOutput for GetOutput {
    fn to_human(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => to_yaml(other),
        }
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Value at `key` as it appears in the document, with configured secrets redacted.
pub fn lookup(settings: &Settings, key: &str) -> Result<Value> {
    let raw = settings
        .lookup(key)
        .with_context(|| format!("Key '{key}' is not set"))?;
    Ok(redact_value(settings, serde_json::to_value(raw)?))
}

pub async fn execute(args: GetArgs, config: Option<&Path>, json_mode: bool) -> Result<()> {
    let settings = ConfigLoader::load(config)?;
    let value = lookup(&settings, &args.key)?;
    output(&GetOutput { key: args.key, value }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "JamfPro_Prod:\n  jps_url: https://jps.example.com\n  api_password: topsecret-value\nPkgBot:\n  port: 8443\n";

    #[test]
    fn test_lookup_scalar() {
        let settings = ConfigLoader::load_from_str(DOC).unwrap();
        assert_eq!(lookup(&settings, "PkgBot.port").unwrap(), 8443);
    }

    #[test]
    fn test_lookup_redacts_secret() {
        let settings = ConfigLoader::load_from_str(DOC).unwrap();
        assert_eq!(lookup(&settings, "JamfPro_Prod.api_password").unwrap(), "<redacted>");
    }

    #[test]
    fn test_lookup_missing_key() {
        let settings = ConfigLoader::load_from_str(DOC).unwrap();
        assert!(lookup(&settings, "PkgBot.missing").is_err());
    }
}
