//! Configuration module for Stateconf
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/stateconf/stateconf.toml)
//! - User configuration (~/.stateconf.toml)
//! - Project configuration (./stateconf.toml)
//! - Environment variables
//!
//! Files may be TOML, YAML or JSON, picked by extension. Later files override
//! earlier ones key by key, so a project file can change one timeout without
//! restating the rest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::lexmodels::LexModelsTimeouts;
use crate::services::sesv2::Sesv2Timeouts;
use crate::telemetry::LoggingConfig;
use crate::waiter::{BackoffPolicy, WaitContext, DEFAULT_NOT_FOUND_CHECKS};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Waiter defaults
    pub waiter: WaiterConfig,

    /// Named timeouts per service
    pub timeouts: TimeoutsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// The `[waiter]` section: defaults for specs that do not set their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaiterConfig {
    /// Consecutive absent polls tolerated while a target state is expected
    pub not_found_checks: u32,

    /// Poll interval policy
    pub backoff: BackoffPolicy,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl WaiterConfig {
    /// A fresh wait context carrying these defaults.
    pub fn context(&self) -> WaitContext {
        WaitContext::new()
            .with_backoff(self.backoff.clone())
            .with_not_found_checks(self.not_found_checks)
    }
}

/// The `[timeouts]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Lex Model Building waits
    pub lexmodels: LexModelsTimeouts,

    /// SESv2 handlers
    pub sesv2: Sesv2Timeouts,
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut merged = Value::Object(serde_json::Map::new());

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                let layer = Self::read_file(&path)?;
                merge_values(&mut merged, layer);
            }
        }

        let mut config: Config =
            serde_json::from_value(merged).context("Invalid configuration")?;

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        // Environment variable
        if let Ok(env_config) = std::env::var("STATECONF_CONFIG") {
            paths.push(PathBuf::from(env_config));
            return paths;
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/stateconf/stateconf.toml"));

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stateconf.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("stateconf.toml"));

        paths
    }

    /// Parse one configuration file into an untyped tree
    fn read_file(path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let value = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
        };

        Ok(value)
    }

    /// Load from a specific file, ignoring the standard locations and environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let value = Self::read_file(path.as_ref())?;
        serde_json::from_value(value).context("Invalid configuration")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // STATECONF_LOG_LEVEL
        if let Ok(level) = std::env::var("STATECONF_LOG_LEVEL") {
            self.logging.level = level.parse().context("STATECONF_LOG_LEVEL")?;
        }

        // STATECONF_LOG_FORMAT
        if let Ok(format) = std::env::var("STATECONF_LOG_FORMAT") {
            self.logging.format = format.parse().context("STATECONF_LOG_FORMAT")?;
        }

        // STATECONF_POLL_INTERVAL
        if let Ok(interval) = std::env::var("STATECONF_POLL_INTERVAL") {
            self.waiter.backoff.poll_interval =
                Some(parse_duration(&interval).context("STATECONF_POLL_INTERVAL")?);
        }

        // STATECONF_MAX_INTERVAL
        if let Ok(interval) = std::env::var("STATECONF_MAX_INTERVAL") {
            self.waiter.backoff.max_interval =
                parse_duration(&interval).context("STATECONF_MAX_INTERVAL")?;
        }

        // STATECONF_NOT_FOUND_CHECKS
        if let Ok(checks) = std::env::var("STATECONF_NOT_FOUND_CHECKS") {
            self.waiter.not_found_checks = checks
                .parse()
                .with_context(|| format!("STATECONF_NOT_FOUND_CHECKS: invalid count '{}'", checks))?;
        }

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Parse a human-readable duration such as `"30s"` or `"5m"`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim())
        .with_context(|| format!("invalid duration '{}'", value))
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.waiter.not_found_checks, 20);
        assert_eq!(config.waiter.backoff.initial_interval, Duration::from_millis(100));
        assert_eq!(config.waiter.backoff.max_interval, Duration::from_secs(10));
        assert_eq!(config.timeouts.sesv2.create, Duration::from_secs(30 * 60));
        assert_eq!(
            config.timeouts.lexmodels.bot_alias_deleted,
            Duration::from_secs(5 * 60)
        );
    }

    #[test]
    fn test_merge_values_is_deep() {
        let mut base = json!({
            "timeouts": { "sesv2": { "create": "10m", "delete": "10m" } },
            "logging": { "level": "info" }
        });
        merge_values(&mut base, json!({ "timeouts": { "sesv2": { "delete": "1m" } } }));

        assert_eq!(
            base,
            json!({
                "timeouts": { "sesv2": { "create": "10m", "delete": "1m" } },
                "logging": { "level": "info" }
            })
        );
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = serde_json::from_value(json!({
            "timeouts": { "lexmodels": { "bot_deleted": "2m" } }
        }))
        .unwrap();

        assert_eq!(config.timeouts.lexmodels.bot_deleted, Duration::from_secs(120));
        assert_eq!(
            config.timeouts.lexmodels.bot_version_created,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 5m ").unwrap(), Duration::from_secs(300));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
