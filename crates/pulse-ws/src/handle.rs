//! Async driver for `ControllerCore` and the consumer handle.
//!
//! The driver is a single task: control requests, transport events and the
//! reconnect timer are multiplexed with `select!`, so window mutations are
//! strictly sequential and follow arrival order. The reconnect timer is an
//! owned `Sleep` held by the driver; cancelling it means dropping it.

use crate::config::{DisplayConfig, StreamConfig};
use crate::controller::{Command, ControllerCore};
use crate::error::{WsError, WsResult};
use crate::state::{ConnectionState, StreamSnapshot};
use crate::transport::{AttemptId, Connector, OpenRequest, TransportEnvelope, TransportHandle};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Transport event channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Connect,
    Disconnect,
    Toggle,
}

/// Entry point for starting a controller.
pub struct StreamController;

impl StreamController {
    /// Spawn the controller task on the current tokio runtime.
    ///
    /// Connects immediately when `config.auto_connect` is set.
    pub fn spawn<C: Connector>(
        config: StreamConfig,
        display: DisplayConfig,
        connector: C,
    ) -> StreamHandle {
        let close_timeout = config.close_timeout();
        let auto_connect = config.auto_connect;
        let core = ControllerCore::new(config, display);

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(core.snapshot()));
        let shutdown = CancellationToken::new();

        let driver = Driver {
            core,
            connector,
            control_rx,
            event_tx,
            event_rx,
            snapshot_tx,
            shutdown: shutdown.clone(),
            active: None,
            reconnect: None,
            closing: Vec::new(),
            close_timeout,
        };

        if auto_connect {
            // Queued before the task starts, so it is the first thing processed
            let _ = control_tx.send(Control::Connect);
        }

        let task = tokio::spawn(driver.run());

        StreamHandle {
            control_tx,
            snapshots: snapshot_rx,
            shutdown,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

/// Cloneable consumer handle: read API plus connection controls.
///
/// When the last handle is dropped the controller tears itself down.
#[derive(Clone)]
pub struct StreamHandle {
    control_tx: mpsc::UnboundedSender<Control>,
    snapshots: watch::Receiver<Arc<StreamSnapshot>>,
    shutdown: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StreamHandle {
    pub fn connect(&self) -> WsResult<()> {
        self.send(Control::Connect)
    }

    pub fn disconnect(&self) -> WsResult<()> {
        self.send(Control::Disconnect)
    }

    pub fn toggle(&self) -> WsResult<()> {
        self.send(Control::Toggle)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<StreamSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshots.borrow().connection.state
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StreamSnapshot>> {
        self.snapshots.clone()
    }

    /// Tear the controller down and wait for it to finish.
    ///
    /// Closes the active transport with a normal-closure frame and cancels
    /// any pending reconnect. Safe to call more than once and from several
    /// clones at once; every caller returns only after teardown completed.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        // Held across the join so concurrent callers queue behind it
        let mut slot = self.task.lock().await;
        if let Some(task) = slot.as_mut() {
            if let Err(e) = task.await {
                warn!(?e, "Controller task ended abnormally");
            }
            *slot = None;
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn send(&self, control: Control) -> WsResult<()> {
        if self.shutdown.is_cancelled() {
            return Err(WsError::ControllerStopped);
        }
        self.control_tx
            .send(control)
            .map_err(|_| WsError::ControllerStopped)
    }
}

struct Driver<C> {
    core: ControllerCore,
    connector: C,
    control_rx: mpsc::UnboundedReceiver<Control>,
    event_tx: mpsc::Sender<TransportEnvelope>,
    event_rx: mpsc::Receiver<TransportEnvelope>,
    snapshot_tx: watch::Sender<Arc<StreamSnapshot>>,
    shutdown: CancellationToken,
    active: Option<(AttemptId, TransportHandle)>,
    reconnect: Option<Pin<Box<Sleep>>>,
    closing: Vec<JoinHandle<()>>,
    close_timeout: Duration,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        info!(url = %self.core.config().url, "Stream controller started");

        loop {
            let commands = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    info!("Stream controller shutdown requested");
                    break;
                }

                control = self.control_rx.recv() => match control {
                    Some(Control::Connect) => self.core.connect(),
                    Some(Control::Disconnect) => self.core.disconnect(),
                    Some(Control::Toggle) => self.core.toggle(),
                    None => {
                        info!("All stream handles dropped");
                        break;
                    }
                },

                Some(envelope) = self.event_rx.recv() => {
                    self.core.handle_event(envelope.attempt, envelope.event)
                }

                () = wait_reconnect(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.core.reconnect_due()
                }
            };

            self.execute(commands);
        }

        let commands = self.core.shutdown();
        self.execute(commands);
        self.finish_closing().await;
        info!("Stream controller stopped");
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Open { attempt, url } => {
                    let handle = self.connector.open(OpenRequest {
                        attempt,
                        url,
                        events: self.event_tx.clone(),
                    });
                    if let Some((old, handle)) = self.active.replace((attempt, handle)) {
                        debug!(attempt = %old, "Replacing leftover transport");
                        handle.abort();
                    }
                }
                Command::Close { attempt, request } => match self.take_active(attempt) {
                    Some(handle) => {
                        self.closing.retain(|task| !task.is_finished());
                        self.closing.push(handle.close(request));
                    }
                    None => debug!(%attempt, "No transport to close"),
                },
                Command::Release { attempt } => {
                    if let Some(handle) = self.take_active(attempt) {
                        handle.abort();
                    }
                }
                Command::ScheduleReconnect(delay) => {
                    self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                }
                Command::CancelReconnect => {
                    if self.reconnect.take().is_some() {
                        debug!("Pending reconnect cancelled");
                    }
                }
                Command::Publish => {
                    self.snapshot_tx.send_replace(Arc::new(self.core.snapshot()));
                }
            }
        }
    }

    fn take_active(&mut self, attempt: AttemptId) -> Option<TransportHandle> {
        match self.active.take() {
            Some((id, handle)) if id == attempt => Some(handle),
            other => {
                self.active = other;
                None
            }
        }
    }

    /// Give closing transports a bounded time to finish their handshake.
    async fn finish_closing(&mut self) {
        for task in self.closing.drain(..) {
            let abort = task.abort_handle();
            if tokio::time::timeout(self.close_timeout, task).await.is_err() {
                debug!("Transport close timed out, aborting");
                abort.abort();
            }
        }
        if let Some((_, handle)) = self.active.take() {
            handle.abort();
        }
    }
}

async fn wait_reconnect(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
