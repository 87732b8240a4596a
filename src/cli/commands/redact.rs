//! Implementation of the `pkgbot-config redact` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Text to redact; read from stdin when omitted
    pub text: Option<String>,

    /// Additional pattern to hide (regular expression), e.g. a one-off token
    #[arg(short, long = "also")]
    pub also: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RedactOutput {
    pub text: String,
}

impl CommandOutput for RedactOutput {
    fn to_human(&self) -> String {
        self.text.trim_end_matches('\n').to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RedactArgs, config: Option<&Path>, json_mode: bool) -> Result<()> {
    let settings = ConfigLoader::load(config)?;

    let input = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let patterns: Vec<&str> = args.also.iter().map(String::as_str).collect();
    let text = settings
        .redact_with(&input, &patterns)
        .context("Invalid --also pattern")?;
    output(&RedactOutput { text }, json_mode);
    Ok(())
}
