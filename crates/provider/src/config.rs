//! Helpers for reading loosely-typed provider configuration.
//!
//! Integration configs and audience settings are open JSON maps. Values may
//! arrive as their natural JSON type or as strings (form-based admin tools
//! store everything as text), so the getters accept both.

use herald_core::ConfigMap;
use serde_json::Value;

use crate::error::ProviderError;

/// Required keys absent from `config`, in declaration order.
pub fn missing_keys(config: &ConfigMap, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|key| !config.contains_key(*key))
        .collect()
}

/// Fail with a configuration error naming every missing required key.
pub fn require_keys(
    kind: &str,
    config: &ConfigMap,
    required: &[&'static str],
) -> Result<(), ProviderError> {
    let missing = missing_keys(config, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Configuration(format!(
            "invalid {kind} configuration: missing {}",
            missing.join(", ")
        )))
    }
}

/// A string value, or `None` when absent, not a string, or blank.
pub fn get_str<'a>(config: &'a ConfigMap, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// A boolean accepting `true`/`false` or their string spellings.
pub fn get_bool(config: &ConfigMap, key: &str) -> Option<bool> {
    match config.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A port-sized integer from a number or numeric string.
pub fn get_u16(config: &ConfigMap, key: &str) -> Result<Option<u16>, ProviderError> {
    let invalid = || ProviderError::Configuration(format!("'{key}' must be an integer in 0..=65535"));
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u16>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// A string from the audience settings if present, else from the config.
pub fn setting_or_config<'a>(
    settings: Option<&'a ConfigMap>,
    config: &'a ConfigMap,
    key: &str,
) -> Option<&'a str> {
    settings
        .and_then(|s| get_str(s, key))
        .or_else(|| get_str(config, key))
}
