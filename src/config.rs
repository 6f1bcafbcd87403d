use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::constants::{DEFAULT_LOG_FILTER, NARROW_FETCH_AFTER, NARROW_FETCH_BEFORE};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server fetch sizing for narrows that cannot be shown locally
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_num_before")]
    pub num_before: u32,
    #[serde(default = "default_num_after")]
    pub num_after: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            num_before: default_num_before(),
            num_after: default_num_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_num_before() -> u32 {
    NARROW_FETCH_BEFORE
}

fn default_num_after() -> u32 {
    NARROW_FETCH_AFTER
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("narrow");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, or defaults if there is none.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [fetch]
            num_before = 100

            [logging]
            filter = "warn"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.fetch.num_before, 100);
        assert_eq!(config.fetch.num_after, NARROW_FETCH_AFTER);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.fetch, FetchConfig::default());
        assert_eq!(config.fetch.num_before, 50);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            fetch: FetchConfig {
                num_before: 10,
                num_after: 20,
            },
            logging: LoggingConfig::default(),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.fetch, config.fetch);
    }
}
