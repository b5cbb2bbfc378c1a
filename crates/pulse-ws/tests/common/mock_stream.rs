//! Mock stream source for integration tests.
//!
//! Provides a WebSocket server that:
//! - Sends an initial batch frame to every new connection
//! - Pushes incremental frames on demand
//! - Can drop all connections without a close handshake
//! - Records close frames sent by clients

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Debug, Clone)]
enum ServerAction {
    Send(String),
    DropAll,
}

/// Build an initial batch frame from raw prices.
pub fn initial_frame(prices: &[f64]) -> String {
    let data: Vec<serde_json::Value> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            serde_json::json!({
                "time": format!("2024-01-01T00:00:{:02}", i),
                "price": price,
                "isNew": false
            })
        })
        .collect();
    serde_json::json!({"type": "initial", "data": data}).to_string()
}

/// Build an incremental point frame.
pub fn point_frame(time: &str, price: f64) -> String {
    serde_json::json!({"time": time, "price": price, "isNew": true}).to_string()
}

/// A mock stream source.
pub struct MockStreamServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    actions: broadcast::Sender<ServerAction>,
    connections: Arc<Mutex<u32>>,
    close_frames: Arc<Mutex<Vec<(u16, String)>>>,
}

impl MockStreamServer {
    /// Start a server that greets each connection with `initial`.
    pub async fn start(initial: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let close_frames: Arc<Mutex<Vec<(u16, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let (actions, _) = broadcast::channel::<ServerAction>(64);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let connections_clone = connections.clone();
        let close_frames_clone = close_frames.clone();
        let actions_clone = actions.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(
                            stream,
                            initial.clone(),
                            actions_clone.subscribe(),
                            connections_clone.clone(),
                            close_frames_clone.clone(),
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            actions,
            connections,
            close_frames,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of completed handshakes.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Send a text frame to every open connection.
    pub fn push(&self, text: String) {
        let _ = self.actions.send(ServerAction::Send(text));
    }

    /// Drop every open connection without a close frame.
    pub fn drop_all(&self) {
        let _ = self.actions.send(ServerAction::DropAll);
    }

    /// Close frames received from clients.
    pub async fn close_frames(&self) -> Vec<(u16, String)> {
        self.close_frames.lock().await.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    initial: String,
    mut actions: broadcast::Receiver<ServerAction>,
    connections: Arc<Mutex<u32>>,
    close_frames: Arc<Mutex<Vec<(u16, String)>>>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let (mut write, mut read) = ws_stream.split();
    if write.send(Message::Text(initial)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            action = actions.recv() => match action {
                Ok(ServerAction::Send(text)) => {
                    if write.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                Ok(ServerAction::DropAll) | Err(_) => return,
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Close(frame))) => {
                    let entry = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    close_frames.lock().await.push(entry);
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return,
            },
        }
    }
}
