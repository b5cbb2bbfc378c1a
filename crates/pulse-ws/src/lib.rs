//! Stream controller for the pulse monitor.
//!
//! Owns one WebSocket connection to the sample source and everything
//! derived from it:
//! - Connection state machine (Disconnected / Connecting / Connected)
//! - Fixed-delay reconnect after an unrequested close, with an owned,
//!   cancellable timer
//! - Rolling window, stats and reading recomputed on every frame
//! - Snapshot publication to consumers over a `watch` channel

pub mod config;
pub mod controller;
pub mod error;
pub mod handle;
pub mod state;
pub mod transport;

pub use config::{DisplayConfig, StreamConfig, DEFAULT_STREAM_URL};
pub use controller::{Command, ControllerCore, CONNECTION_LOST_MESSAGE, TRANSPORT_ERROR_MESSAGE};
pub use error::{WsError, WsResult};
pub use handle::{StreamController, StreamHandle};
pub use state::{ConnectionState, ConnectionStatus, StreamSnapshot};
pub use transport::{
    AttemptId, CloseRequest, Connector, OpenRequest, TransportEnvelope, TransportEvent,
    TransportHandle, WsConnector,
};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Install the ring provider used by the rustls `wss://` connector.
/// Must be called before any `wss://` connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
