//! Implementation of the `pkgbot-config check` command.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ConfigLoader, Settings};
use crate::infrastructure::credentials;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fail when a credential is blank or a key is not recognised
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct CheckOutput {
    pub valid: bool,
    pub source: Option<PathBuf>,
    pub environments: Vec<String>,
    pub unknown_keys: Vec<String>,
    pub missing_credentials: Vec<String>,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![match &self.source {
            Some(path) => format!("Configuration OK: {}", path.display()),
            None => "Configuration OK".to_string(),
        }];

        if self.environments.is_empty() {
            lines.push("No Jamf Pro environments defined".to_string());
        } else {
            lines.push(format!("Jamf Pro environments: {}", self.environments.join(", ")));
        }

        if !self.unknown_keys.is_empty() {
            lines.push("\nUnknown keys (ignored):".to_string());
            for key in &self.unknown_keys {
                lines.push(format!("  - {key}"));
            }
        }
        if !self.missing_credentials.is_empty() {
            lines.push("\nBlank credentials:".to_string());
            for message in &self.missing_credentials {
                lines.push(format!("  - {message}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Every credential a full deployment would ask for, as error messages.
pub fn missing_credentials(settings: &Settings) -> Vec<String> {
    let mut missing = Vec::new();
    for (name, env) in settings.jamf_pro_environments() {
        if let Err(e) = credentials::jamf_api(name, env) {
            missing.push(e.to_string());
        }
    }
    let checks = [
        credentials::slack_bot_token(settings.slack()).err(),
        credentials::slack_signing_secret(settings.slack()).err(),
        credentials::git_private_key(settings.git()).err(),
    ];
    missing.extend(checks.into_iter().flatten().map(|e| e.to_string()));
    missing
}

pub async fn execute(args: CheckArgs, config: Option<&Path>, json_mode: bool) -> Result<()> {
    let settings = ConfigLoader::load(config)?;

    let missing = missing_credentials(&settings);
    let valid = !args.strict || (missing.is_empty() && settings.unknown_keys().is_empty());

    let result = CheckOutput {
        valid,
        source: settings.source().map(Path::to_path_buf),
        environments: settings
            .jamf_pro_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        unknown_keys: settings.unknown_keys().to_vec(),
        missing_credentials: missing,
    };
    output(&result, json_mode);

    if !valid {
        anyhow::bail!("strict check failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_blank_values() {
        let settings = ConfigLoader::load_from_str(
            "JamfPro_Prod:\n  jps_url: https://jps.example.com\n  api_user: svc\nSlack:\n  bot_token: xoxb-1\n  signing_secret: abc\nGit:\n  ssh_private_key: key\n",
        )
        .unwrap();

        assert_eq!(
            missing_credentials(&settings),
            vec!["Missing credential: JamfPro_Prod.api_password is not set".to_string()]
        );
    }
}
