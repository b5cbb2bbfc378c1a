//! Transport abstraction and the tokio-tungstenite implementation.
//!
//! Each connection attempt runs as its own task and reports back to the
//! controller through a shared event channel. Every event carries the
//! attempt id so the controller can ignore connections it already gave up on.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tracing::{debug, info, warn};

/// Identifier of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Handshake completed.
    Open,
    /// One inbound text frame.
    Message(String),
    /// The connection could not be established.
    Error(String),
    /// The connection ended. `clean` is true when the peer sent a close frame.
    Closed {
        code: u16,
        reason: String,
        clean: bool,
    },
}

/// Transport event tagged with its attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEnvelope {
    pub attempt: AttemptId,
    pub event: TransportEvent,
}

/// Close code and reason sent when the controller ends a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseRequest {
    pub code: u16,
    pub reason: String,
}

impl CloseRequest {
    /// Normal closure (1000).
    pub const NORMAL: u16 = 1000;

    pub fn normal(reason: impl Into<String>) -> Self {
        Self {
            code: Self::NORMAL,
            reason: reason.into(),
        }
    }
}

/// Everything a connector needs to start an attempt.
#[derive(Debug)]
pub struct OpenRequest {
    pub attempt: AttemptId,
    pub url: String,
    pub events: mpsc::Sender<TransportEnvelope>,
}

/// Owned handle to a running attempt.
#[derive(Debug)]
pub struct TransportHandle {
    close_tx: Option<oneshot::Sender<CloseRequest>>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    pub fn new(close_tx: oneshot::Sender<CloseRequest>, task: JoinHandle<()>) -> Self {
        Self {
            close_tx: Some(close_tx),
            task,
        }
    }

    /// Ask the transport to close gracefully.
    ///
    /// Returns the task so the caller can wait for the close to finish.
    pub fn close(mut self, request: CloseRequest) -> JoinHandle<()> {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(request);
        }
        self.task
    }

    /// Stop the transport without a close handshake.
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Starts connection attempts.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, request: OpenRequest) -> TransportHandle;
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsConnector {
    close_timeout: Duration,
}

impl WsConnector {
    pub fn new(close_timeout: Duration) -> Self {
        Self { close_timeout }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl Connector for WsConnector {
    fn open(&self, request: OpenRequest) -> TransportHandle {
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(run_attempt(request, close_rx, self.close_timeout));
        TransportHandle::new(close_tx, task)
    }
}

struct Emitter {
    attempt: AttemptId,
    events: mpsc::Sender<TransportEnvelope>,
}

impl Emitter {
    async fn emit(&self, event: TransportEvent) {
        let envelope = TransportEnvelope {
            attempt: self.attempt,
            event,
        };
        if self.events.send(envelope).await.is_err() {
            debug!(attempt = %self.attempt, "Controller gone, dropping transport event");
        }
    }
}

/// How a session ended without a transport error.
enum SessionEnd {
    /// We sent the close frame.
    ClosedByController,
    /// The peer sent a close frame.
    ClosedByPeer { code: u16, reason: String },
}

async fn run_attempt(
    request: OpenRequest,
    mut close_rx: oneshot::Receiver<CloseRequest>,
    close_timeout: Duration,
) {
    let OpenRequest {
        attempt,
        url,
        events,
    } = request;
    let emitter = Emitter { attempt, events };

    info!(%attempt, url = %url, "Connecting to stream source");

    // TCP_NODELAY: frames are small and latency matters more than throughput
    let stream = tokio::select! {
        result = connect_async_tls_with_config(&url, None, true, None) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                emitter.emit(TransportEvent::Error(e.to_string())).await;
                return;
            }
        },
        _ = &mut close_rx => {
            debug!(%attempt, "Closed before handshake completed");
            return;
        }
    };

    emitter.emit(TransportEvent::Open).await;

    match run_session(stream, &emitter, close_rx, close_timeout).await {
        Ok(SessionEnd::ClosedByController) => {
            debug!(%attempt, "Transport closed by controller");
        }
        Ok(SessionEnd::ClosedByPeer { code, reason }) => {
            emitter
                .emit(TransportEvent::Closed {
                    code,
                    reason,
                    clean: true,
                })
                .await;
        }
        Err(e) => {
            let (code, reason) = match e {
                WsError::ConnectionClosed { code, reason } => (code, reason),
                other => (1006, other.to_string()),
            };
            emitter
                .emit(TransportEvent::Closed {
                    code,
                    reason,
                    clean: false,
                })
                .await;
        }
    }
}

async fn run_session(
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    emitter: &Emitter,
    mut close_rx: oneshot::Receiver<CloseRequest>,
    close_timeout: Duration,
) -> WsResult<SessionEnd> {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            request = &mut close_rx => {
                let frame = request.ok().map(|r| CloseFrame {
                    code: CloseCode::from(r.code),
                    reason: r.reason.into(),
                });
                write.send(Message::Close(frame)).await?;

                // Wait briefly for the peer to acknowledge
                let drain = async {
                    while let Some(Ok(msg)) = read.next().await {
                        if msg.is_close() {
                            break;
                        }
                    }
                };
                if tokio::time::timeout(close_timeout, drain).await.is_err() {
                    debug!("Close acknowledgement timed out");
                }
                return Ok(SessionEnd::ClosedByController);
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        emitter.emit(TransportEvent::Message(text)).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received ping, sending pong");
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1005, "No status received".to_string()));
                        warn!(code, %reason, "Stream closed by server");
                        return Ok(SessionEnd::ClosedByPeer { code, reason });
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!(len = data.len(), "Ignoring binary frame");
                    }
                    Some(Err(e)) => {
                        warn!(?e, "Stream read error");
                        return Err(e.into());
                    }
                    None => {
                        warn!("Stream ended without close frame");
                        return Err(WsError::ConnectionClosed {
                            code: 1006,
                            reason: "Stream ended".to_string(),
                        });
                    }
                    _ => {}
                }
            }
        }
    }
}
