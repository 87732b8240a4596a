//! Implementation of the `pkgbot-config show` command.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::path::Path;

use crate::cli::output::{output, redact_value, to_yaml, CommandOutput};
use crate::domain::models::{Section, JAMF_PRO_PREFIX};
use crate::domain::models::{
    AutoPkgSettings, CommonSettings, GitSettings, ServerSettings, ServiceSettings, SlackSettings,
};
use crate::infrastructure::config::{ConfigLoader, Settings};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only this section, e.g. `PkgBot` or `JamfPro_Prod`
    pub section: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct ShowOutput {
    pub sections: Value,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        to_yaml(&self.sections)
    }

    fn to_json(&self) -> Value {
        self.sections.clone()
    }
}

/// All sections as JSON, secrets already masked and configured values redacted.
pub fn sections(settings: &Settings) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    map.insert(
        AutoPkgSettings::SECTION.to_string(),
        serde_json::to_value(settings.autopkg())?,
    );
    for (name, env) in settings.jamf_pro_environments() {
        map.insert(format!("{JAMF_PRO_PREFIX}{name}"), serde_json::to_value(env)?);
    }
    map.insert(GitSettings::SECTION.to_string(), serde_json::to_value(settings.git())?);
    map.insert(
        ServiceSettings::SECTION.to_string(),
        serde_json::to_value(settings.services())?,
    );
    map.insert(SlackSettings::SECTION.to_string(), serde_json::to_value(settings.slack())?);
    map.insert(
        ServerSettings::SECTION.to_string(),
        serde_json::to_value(settings.server())?,
    );
    map.insert(
        CommonSettings::SECTION.to_string(),
        serde_json::to_value(settings.common())?,
    );

    Ok(map
        .into_iter()
        .map(|(key, value)| (key, redact_value(settings, value)))
        .collect())
}

pub async fn execute(args: ShowArgs, config: Option<&Path>, json_mode: bool) -> Result<()> {
    let settings = ConfigLoader::load(config)?;
    let mut all = sections(&settings)?;

    let sections = match args.section {
        Some(name) => all
            .remove(&name)
            .with_context(|| format!("Section '{name}' is not defined"))?,
        None => Value::Object(all),
    };

    output(&ShowOutput { sections }, json_mode);
    Ok(())
}
