//! Application configuration.

use crate::error::{AppError, AppResult};
use pulse_ws::{DisplayConfig, StreamConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PULSE_CONFIG";
/// Environment variable overriding the stream URL.
pub const URL_ENV: &str = "PULSE_WS_URL";
/// Config file used when none is named.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Load configuration from file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load from an explicitly named file, or from the default path.
    ///
    /// A missing default file means built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(explicit_path: Option<&str>) -> AppResult<Self> {
        match explicit_path {
            Some(path) => {
                info!(config_path = %path, "Loading configuration");
                Self::from_file(path)
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                info!(config_path = DEFAULT_CONFIG_PATH, "Loading configuration");
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply URL overrides: CLI flag beats environment beats file.
    pub fn apply_url_override(&mut self, cli_url: Option<String>, env_url: Option<String>) {
        if let Some(url) = cli_url.or(env_url).filter(|u| !u.trim().is_empty()) {
            self.stream.url = url;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.stream
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::RemapPolicy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.stream.url, "ws://localhost:8000/ws");
        assert_eq!(config.display.zones.zones().len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [stream]
            url = "wss://sensor.example/ws"
            window_capacity = 30
            reconnect_delay_ms = 5000
            auto_connect = false

            [stream.remap]
            kind = "linear"
            scale = 0.7
            offset = 60.0

            [display.thresholds]
            abnormal_low = 35.0
            abnormal_high = 190.0

            [[display.zones]]
            min = 0.0
            max = 99.0
            color = "green"
            label = "Calm"

            [[display.zones]]
            min = 100.0
            max = 250.0
            color = "red"
            label = "Busy"
        "#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.stream.url, "wss://sensor.example/ws");
        assert_eq!(config.stream.window_capacity, 30);
        assert_eq!(config.stream.reconnect_delay_ms, 5000);
        assert!(!config.stream.auto_connect);
        assert_eq!(config.stream.remap, RemapPolicy::DEMO_LINEAR);
        assert_eq!(config.display.thresholds.abnormal_low, 35.0);
        assert_eq!(config.display.zones.classify(150.0).label, "Busy");
    }

    #[test]
    fn test_overlapping_zones_rejected() {
        let toml = r#"
            [[display.zones]]
            min = 0.0
            max = 100.0
            color = "green"
            label = "A"

            [[display.zones]]
            min = 50.0
            max = 150.0
            color = "red"
            label = "B"
        "#;
        assert!(matches!(
            AppConfig::from_toml_str(toml),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_zero_capacity_fails_validation() {
        let config = AppConfig::from_toml_str("[stream]\nwindow_capacity = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_override_precedence() {
        let mut config = AppConfig::default();
        config.apply_url_override(None, Some("ws://env:1/ws".to_string()));
        assert_eq!(config.stream.url, "ws://env:1/ws");

        config.apply_url_override(
            Some("ws://cli:2/ws".to_string()),
            Some("ws://env:1/ws".to_string()),
        );
        assert_eq!(config.stream.url, "ws://cli:2/ws");

        config.apply_url_override(None, Some("  ".to_string()));
        assert_eq!(config.stream.url, "ws://cli:2/ws");
    }

    #[test]
    fn test_shipped_default_config_matches_defaults() {
        let config = AppConfig::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AppConfig::load(Some("/nonexistent/pulse.toml")).is_err());
    }
}
