//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`KgchatSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::KgchatSettings;

/// Resolve the path to the settings file (`~/.kgchat/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".kgchat").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<KgchatSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from an explicitly named file. Unlike the default path, the
/// file must exist.
pub fn load_settings_from_explicit(path: &Path) -> Result<KgchatSettings> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.to_path_buf()));
    }
    load_settings_from_path(path)
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<KgchatSettings> {
    let mut settings = read_layers(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn read_layers(path: &Path) -> Result<KgchatSettings> {
    let defaults = serde_json::to_value(KgchatSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut KgchatSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`. Empty values are treated as unset;
/// values that fail to parse are ignored with a warning.
pub fn apply_overrides(settings: &mut KgchatSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Completion engine ───────────────────────────────────────────
    if let Some(v) = string("OPENAI_API_KEY") {
        settings.llm.api_key = Some(v.into());
    }
    if let Some(v) = string("KGCHAT_MODEL") {
        settings.llm.model = v;
    }
    if let Some(v) = string("KGCHAT_LLM_BASE_URL") {
        settings.llm.base_url = v;
    }

    // ── Graph database ──────────────────────────────────────────────
    if let Some(v) = string("NEO4J_URL") {
        settings.graph.url = v;
    }
    if let Some(v) = string("NEO4J_USER") {
        settings.graph.user = Some(v);
    }
    if let Some(v) = string("NEO4J_PASSWORD") {
        settings.graph.password = Some(v.into());
    }
    if let Some(v) = string("NEO4J_DATABASE") {
        settings.graph.database = v;
    }

    // ── Search and agent limits ─────────────────────────────────────
    if let Some(v) = string("KGCHAT_SEARCH_URL") {
        settings.search.url = v;
    }
    if let Some(raw) = string("KGCHAT_MAX_RESPONSE_TOKENS") {
        match parse_u32_range(&raw, 1, 1_000_000) {
            Some(v) => settings.agent.max_response_tokens = v,
            None => warn!(key = "KGCHAT_MAX_RESPONSE_TOKENS", value = %raw, "invalid u32 env var, ignoring"),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("KGCHAT_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(raw) = string("KGCHAT_LOG_JSON") {
        match parse_bool(&raw) {
            Some(v) => settings.logging.json = v,
            None => warn!(key = "KGCHAT_LOG_JSON", value = %raw, "invalid boolean env var, ignoring"),
        }
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
