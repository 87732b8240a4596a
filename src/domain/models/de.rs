//! Lenient deserializers for hand-edited settings documents.
//!
//! A YAML key written without a value (`api_user:`) arrives as null. For
//! strings and flags that is treated the same as leaving the key out.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

struct BlankString;

impl Visitor<'_> for BlankString {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or nothing")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }
}

/// String that may be null or numeric in the document.
pub fn blank_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(BlankString)
}

/// Boolean defaulting to `true` when null.
pub fn true_unless_set<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Boolean defaulting to `false` when null.
pub fn false_unless_set<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Any defaultable value, taking its default when null.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "blank_string")]
        name: String,
        #[serde(default = "default_true", deserialize_with = "true_unless_set")]
        verify: bool,
        #[serde(default, deserialize_with = "false_unless_set")]
        reload: bool,
    }

    #[test]
    fn test_null_values_use_defaults() {
        let flags: Flags = serde_yaml::from_str("name:\nverify:\nreload:\n").unwrap();
        assert_eq!(flags.name, "");
        assert!(flags.verify);
        assert!(!flags.reload);
    }

    #[test]
    fn test_missing_values_use_defaults() {
        let flags: Flags = serde_yaml::from_str("{}").unwrap();
        assert!(flags.verify);
        assert!(!flags.reload);
    }

    #[test]
    fn test_explicit_values_win() {
        let flags: Flags = serde_yaml::from_str("name: 42\nverify: False\nreload: True\n").unwrap();
        assert_eq!(flags.name, "42");
        assert!(!flags.verify);
        assert!(flags.reload);
    }

    #[derive(Deserialize)]
    struct Lists {
        #[serde(default, deserialize_with = "null_as_default")]
        names: Vec<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        table: std::collections::BTreeMap<String, String>,
    }

    #[test]
    fn test_null_collections_are_empty() {
        let lists: Lists = serde_yaml::from_str("names:
table:
").unwrap();
        assert!(lists.names.is_empty());
        assert!(lists.table.is_empty());

        let lists: Lists = serde_yaml::from_str("names: [a]
table: {k: v}
").unwrap();
        assert_eq!(lists.names, vec!["a".to_string()]);
        assert_eq!(lists.table["k"], "v");
    }

    #[test]
    fn test_non_boolean_flag_rejected() {
        let result: Result<Flags, _> = serde_yaml::from_str("verify: maybe\n");
        assert!(result.is_err());
    }
}
