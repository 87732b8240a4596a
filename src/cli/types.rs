//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{check::CheckArgs, get::GetArgs, redact::RedactArgs, show::ShowArgs};

#[derive(Parser)]
#[command(name = "pkgbot-config")]
#[command(about = "Load, validate and inspect PkgBot settings", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Settings file (defaults to $PKGBOT_CONFIG, then settings/pkgbot_config.yaml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the settings document
    Check(CheckArgs),

    /// Print loaded settings with secrets redacted
    Show(ShowArgs),

    /// Print the value at a dotted key, e.g. `JamfPro_Prod.jps_url`
    Get(GetArgs),

    /// Redact configured secrets from text
    Redact(RedactArgs),

    /// Run with the configured logging and reload on SIGHUP
    Watch,
}
