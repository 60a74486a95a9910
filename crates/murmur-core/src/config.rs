//! Client configuration loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reveal::RevealTiming;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the conversation backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

/// Typing-reveal pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealConfig {
    /// Delay before the first character of each message, in milliseconds.
    #[serde(default = "default_thinking_delay_ms")]
    pub thinking_delay_ms: u64,
    /// Delay between consecutive characters, in milliseconds.
    #[serde(default = "default_char_interval_ms")]
    pub char_interval_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            thinking_delay_ms: default_thinking_delay_ms(),
            char_interval_ms: default_char_interval_ms(),
        }
    }
}

fn default_thinking_delay_ms() -> u64 {
    600
}

fn default_char_interval_ms() -> u64 {
    15
}

impl RevealConfig {
    /// Converts the millisecond fields into scheduler timing.
    pub fn timing(&self) -> RevealTiming {
        RevealTiming {
            thinking_delay: Duration::from_millis(self.thinking_delay_ms),
            char_interval: Duration::from_millis(self.char_interval_ms),
        }
    }
}

impl Config {
    /// Loads configuration from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::load_from(&dir.path().join("absent.toml")).expect("load config");
        assert_eq!(config, Config::default());
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reveal]\nchar_interval_ms = 5\n").expect("write config");

        let config = Config::load_from(&path).expect("load config");
        assert_eq!(config.reveal.char_interval_ms, 5);
        assert_eq!(config.reveal.thinking_delay_ms, 600);
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = not toml").expect("write config");

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_timing_conversion() {
        let reveal = RevealConfig {
            thinking_delay_ms: 100,
            char_interval_ms: 2,
        };
        let timing = reveal.timing();
        assert_eq!(timing.thinking_delay, Duration::from_millis(100));
        assert_eq!(timing.char_interval, Duration::from_millis(2));
    }
}
