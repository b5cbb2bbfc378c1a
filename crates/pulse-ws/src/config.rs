//! Stream controller configuration.

use crate::error::{WsError, WsResult};
use pulse_core::{RemapPolicy, StatusThresholds, ZoneTable};
use pulse_feed::{EmptyWindowPolicy, DEFAULT_WINDOW_CAPACITY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_STREAM_URL: &str = "ws://localhost:8000/ws";

/// Connection and windowing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// WebSocket URL of the sample source.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum samples kept in the rolling window.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// Delay before reconnecting after an unrequested close.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Connect as soon as the controller starts.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
    /// How long to wait for the peer's close acknowledgement.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// Raw field to domain value transform.
    #[serde(default)]
    pub remap: RemapPolicy,
    /// Stats reported when the window is empty.
    #[serde(default)]
    pub empty_window: EmptyWindowPolicy,
}

fn default_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_auto_connect() -> bool {
    true
}

fn default_close_timeout_ms() -> u64 {
    1000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            window_capacity: default_window_capacity(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            auto_connect: default_auto_connect(),
            close_timeout_ms: default_close_timeout_ms(),
            remap: RemapPolicy::default(),
            empty_window: EmptyWindowPolicy::default(),
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn validate(&self) -> WsResult<()> {
        if self.url.trim().is_empty() {
            return Err(WsError::InvalidConfig("url must not be empty".to_string()));
        }
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(WsError::InvalidConfig(format!(
                "url must use ws:// or wss://, got {}",
                self.url
            )));
        }
        if self.window_capacity == 0 {
            return Err(WsError::InvalidConfig(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        self.remap
            .validate()
            .map_err(|e| WsError::InvalidConfig(e.to_string()))
    }
}

/// Zone table and status thresholds used for readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub zones: ZoneTable,
    #[serde(default)]
    pub thresholds: StatusThresholds,
}
