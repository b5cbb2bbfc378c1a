//! Connection state machine and window pipeline.
//!
//! `ControllerCore` performs no I/O. Each operation mutates state and
//! returns the `Command`s the driver must carry out (open or close a
//! transport, arm or cancel the reconnect timer, publish a snapshot).
//!
//! An intentional close is recognised by attempt id: `disconnect()` and
//! `shutdown()` forget the active attempt before closing it, so the close
//! event that follows is stale and ignored. Every other close of the active
//! attempt is treated as a lost connection and schedules one reconnect.

use crate::config::{DisplayConfig, StreamConfig};
use crate::state::{ConnectionState, ConnectionStatus, StreamSnapshot};
use crate::transport::{AttemptId, CloseRequest, TransportEvent};
use chrono::Utc;
use pulse_feed::{FeedUpdate, FrameDecoder, Reading, RollingWindow, StatsAggregator};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shown after a transport error.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Failed to connect to the source.";
/// Shown after an unrequested close while a reconnect is pending.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Attempting to reconnect...";

const USER_DISCONNECT_REASON: &str = "User disconnected";
const SHUTDOWN_REASON: &str = "Controller shut down";

/// Side effect requested by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a new transport for `attempt`.
    Open { attempt: AttemptId, url: String },
    /// Close the transport of `attempt` with a close frame.
    Close {
        attempt: AttemptId,
        request: CloseRequest,
    },
    /// Drop the transport of `attempt` without a handshake.
    Release { attempt: AttemptId },
    /// Arm the reconnect timer, replacing any armed one.
    ScheduleReconnect(Duration),
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// Publish a fresh snapshot to consumers.
    Publish,
}

/// Stream controller state, window and derived values.
pub struct ControllerCore {
    config: StreamConfig,
    display: DisplayConfig,
    decoder: FrameDecoder,
    window: RollingWindow,
    stats: StatsAggregator,
    state: ConnectionState,
    last_error: Option<String>,
    active_attempt: Option<AttemptId>,
    next_attempt: u64,
    reconnect_pending: bool,
    dropped_frames: u64,
}

impl ControllerCore {
    pub fn new(config: StreamConfig, display: DisplayConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(config.remap),
            window: RollingWindow::new(config.window_capacity),
            stats: StatsAggregator::new(config.empty_window),
            state: ConnectionState::Disconnected,
            last_error: None,
            active_attempt: None,
            next_attempt: 1,
            reconnect_pending: false,
            dropped_frames: 0,
            config,
            display,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active_attempt(&self) -> Option<AttemptId> {
        self.active_attempt
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Number of inbound frames dropped as malformed.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Start a connection attempt. Only valid from `Disconnected`.
    pub fn connect(&mut self) -> Vec<Command> {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "connect ignored");
            return Vec::new();
        }

        let mut commands = Vec::with_capacity(3);
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }

        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        self.active_attempt = Some(attempt);
        self.state = ConnectionState::Connecting;
        self.last_error = None;

        info!(%attempt, url = %self.config.url, "Connecting");
        commands.push(Command::Open {
            attempt,
            url: self.config.url.clone(),
        });
        commands.push(Command::Publish);
        commands
    }

    /// Close the connection on request. Suppresses the reconnect that an
    /// unrequested close would schedule, and clears any error.
    pub fn disconnect(&mut self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(3);

        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }

        if let Some(attempt) = self.active_attempt.take() {
            info!(%attempt, "Disconnecting on request");
            commands.push(Command::Close {
                attempt,
                request: CloseRequest::normal(USER_DISCONNECT_REASON),
            });
        }

        let changed = !commands.is_empty()
            || self.state != ConnectionState::Disconnected
            || self.last_error.is_some();

        self.state = ConnectionState::Disconnected;
        self.last_error = None;

        if changed {
            commands.push(Command::Publish);
        }
        commands
    }

    /// `disconnect()` when connected, otherwise `connect()`.
    pub fn toggle(&mut self) -> Vec<Command> {
        if self.state == ConnectionState::Connected {
            self.disconnect()
        } else {
            self.connect()
        }
    }

    /// The reconnect timer fired.
    pub fn reconnect_due(&mut self) -> Vec<Command> {
        if !self.reconnect_pending {
            debug!("Stale reconnect timer ignored");
            return Vec::new();
        }
        self.reconnect_pending = false;
        info!("Reconnecting after lost connection");
        self.connect()
    }

    /// Teardown: close the active transport and cancel any pending reconnect.
    pub fn shutdown(&mut self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(3);

        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }

        if let Some(attempt) = self.active_attempt.take() {
            commands.push(Command::Close {
                attempt,
                request: CloseRequest::normal(SHUTDOWN_REASON),
            });
        }

        self.state = ConnectionState::Disconnected;
        self.last_error = None;
        commands.push(Command::Publish);
        commands
    }

    /// Process one transport event.
    pub fn handle_event(&mut self, attempt: AttemptId, event: TransportEvent) -> Vec<Command> {
        if self.active_attempt != Some(attempt) {
            debug!(%attempt, ?event, "Ignoring event from abandoned attempt");
            return Vec::new();
        }

        match event {
            TransportEvent::Open => self.on_open(attempt),
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Error(detail) => self.on_error(attempt, &detail),
            TransportEvent::Closed {
                code,
                reason,
                clean,
            } => self.on_closed(attempt, code, &reason, clean),
        }
    }

    fn on_open(&mut self, attempt: AttemptId) -> Vec<Command> {
        if self.state != ConnectionState::Connecting {
            debug!(%attempt, state = ?self.state, "Unexpected open event");
            return Vec::new();
        }
        self.state = ConnectionState::Connected;
        info!(%attempt, "Stream connected");
        vec![Command::Publish]
    }

    fn on_message(&mut self, text: &str) -> Vec<Command> {
        if self.state != ConnectionState::Connected {
            debug!(state = ?self.state, "Message outside Connected state dropped");
            return Vec::new();
        }

        match self.decoder.decode(text) {
            Ok(FeedUpdate::Reset(samples)) => {
                debug!(count = samples.len(), "Window reset from initial batch");
                self.window.reset(samples);
            }
            Ok(FeedUpdate::Append(sample)) => {
                debug!(value = sample.value, "Sample appended");
                self.window.append(sample);
            }
            Err(e) => {
                self.dropped_frames += 1;
                warn!(error = %e, dropped = self.dropped_frames, "Dropping malformed frame");
                return Vec::new();
            }
        }

        self.stats.recompute(self.window.iter());
        vec![Command::Publish]
    }

    fn on_error(&mut self, attempt: AttemptId, detail: &str) -> Vec<Command> {
        error!(%attempt, detail, "Stream transport error");
        self.active_attempt = None;
        self.state = ConnectionState::Disconnected;
        self.last_error = Some(TRANSPORT_ERROR_MESSAGE.to_string());
        vec![Command::Release { attempt }, Command::Publish]
    }

    fn on_closed(&mut self, attempt: AttemptId, code: u16, reason: &str, clean: bool) -> Vec<Command> {
        self.active_attempt = None;
        self.state = ConnectionState::Disconnected;
        self.last_error = Some(CONNECTION_LOST_MESSAGE.to_string());
        self.reconnect_pending = true;

        let delay = self.config.reconnect_delay();
        warn!(
            %attempt,
            code,
            reason,
            clean,
            delay_ms = delay.as_millis() as u64,
            "Stream connection lost, scheduling reconnect"
        );
        vec![Command::ScheduleReconnect(delay), Command::Publish]
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            samples: self.window.current(),
            stats: self.stats.current(),
            reading: Reading::from_window(
                &self.window,
                &self.display.zones,
                &self.display.thresholds,
            ),
            connection: ConnectionStatus {
                state: self.state,
                error: self.last_error.clone(),
            },
            updated_at: Utc::now(),
        }
    }
}
