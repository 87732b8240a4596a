//! Output formatting utilities for the CLI.

use serde::Serialize;

use crate::infrastructure::config::Settings;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Redact every string leaf of `value`.
pub fn redact_value(settings: &Settings, value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::String(s) => Value::String(settings.redact(&s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| redact_value(settings, item))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, redact_value(settings, item)))
                .collect(),
        ),
        other => other,
    }
}

/// Render a JSON value as YAML for human output.
pub fn to_yaml(value: &serde_json::Value) -> String {
    serde_yaml::to_string(value)
        .unwrap_or_default()
        .trim_end()
        .to_string()
}
