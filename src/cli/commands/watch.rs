//! Implementation of the `pkgbot-config watch` command.
//!
//! Loads the settings with a stderr logger in scope, installs the logger
//! described by `PkgBot.log_config`, then waits for signals: SIGHUP reloads
//! the settings, Ctrl-C exits. Handlers are fixed for the life of the
//! process; the secrets they redact follow each reload.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::fmt::MakeWriter;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigHandle;
use crate::infrastructure::logging::logger::bootstrap_subscriber;
use crate::infrastructure::logging::LoggerImpl;

#[derive(Debug, serde::Serialize)]
pub struct WatchOutput {
    pub reloads: u32,
    pub failed_reloads: u32,
}

impl CommandOutput for WatchOutput {
    fn to_human(&self) -> String {
        format!(
            "Stopped after {} reload(s), {} failed",
            self.reloads, self.failed_reloads
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Load the settings while `writer` receives loader warnings.
pub fn load_handle<W>(config: Option<&Path>, writer: W) -> Result<ConfigHandle>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let handle = tracing::subscriber::with_default(bootstrap_subscriber(writer), || {
        ConfigHandle::load(config)
    })?;
    Ok(handle)
}

pub async fn execute(config: Option<&Path>, json_mode: bool) -> Result<()> {
    let handle = load_handle(config, std::io::stderr)?;
    let settings = handle.snapshot();
    let _logger = LoggerImpl::init(&settings.server().log_config, &handle.scrubber())?;

    info!(
        bind = %settings.server().bind_address(),
        tls = settings.server().uses_tls(),
        environments = ?settings.jamf_pro_names(),
        "watching configuration"
    );

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    let mut result = WatchOutput {
        reloads: 0,
        failed_reloads: 0,
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => match handle.reload() {
                Ok(fresh) => {
                    result.reloads += 1;
                    info!(loaded_at = %fresh.loaded_at(), "configuration reloaded on SIGHUP");
                }
                Err(e) => {
                    result.failed_reloads += 1;
                    error!(error = %e, "configuration reload failed, keeping current settings");
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    output(&result, json_mode);
    Ok(())
}
