//! Connection state and consumer-facing snapshots.

use chrono::{DateTime, Utc};
use pulse_core::{Sample, WindowStats};
use pulse_feed::Reading;
use serde::Serialize;

/// Connection state.
///
/// Per attempt: Disconnected -> Connecting -> (Connected | Disconnected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }
}

/// Connection state plus the last user-visible error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub error: Option<String>,
}

/// Read-only view handed to consumers after every change.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSnapshot {
    /// Window contents, oldest first.
    pub samples: Vec<Sample>,
    pub stats: WindowStats,
    /// Derived values for the newest sample; `None` while the window is empty.
    pub reading: Option<Reading>,
    pub connection: ConnectionStatus,
    pub updated_at: DateTime<Utc>,
}

impl StreamSnapshot {
    pub fn is_connected(&self) -> bool {
        self.connection.state == ConnectionState::Connected
    }
}

impl Default for StreamSnapshot {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            stats: WindowStats::default(),
            reading: None,
            connection: ConnectionStatus::default(),
            updated_at: Utc::now(),
        }
    }
}
