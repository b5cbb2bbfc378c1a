//! In-process connector whose transport events are driven by the test.

use parking_lot::Mutex;
use pulse_ws::{
    AttemptId, CloseRequest, Connector, OpenRequest, TransportEnvelope, TransportEvent,
    TransportHandle,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

struct OpenedAttempt {
    attempt: AttemptId,
    url: String,
    events: mpsc::Sender<TransportEnvelope>,
    close_rx: oneshot::Receiver<CloseRequest>,
}

/// Records every attempt the controller opens.
#[derive(Clone, Default)]
pub struct FakeConnector {
    opened: Arc<Mutex<Vec<OpenedAttempt>>>,
    hang_on_close: bool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transports never finish, so a close waits out the close timeout.
    pub fn hanging() -> Self {
        Self {
            hang_on_close: true,
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn attempt(&self, index: usize) -> AttemptId {
        self.opened.lock()[index].attempt
    }

    pub fn url(&self, index: usize) -> String {
        self.opened.lock()[index].url.clone()
    }

    /// Deliver an event as if it came from the transport of attempt `index`.
    pub async fn emit(&self, index: usize, event: TransportEvent) {
        let (attempt, events) = {
            let opened = self.opened.lock();
            (opened[index].attempt, opened[index].events.clone())
        };
        events
            .send(TransportEnvelope { attempt, event })
            .await
            .expect("controller should accept events");
    }

    /// Close request sent to attempt `index`, if any.
    pub fn close_request(&self, index: usize) -> Option<CloseRequest> {
        self.opened.lock()[index].close_rx.try_recv().ok()
    }
}

impl Connector for FakeConnector {
    fn open(&self, request: OpenRequest) -> TransportHandle {
        let (close_tx, close_rx) = oneshot::channel();
        self.opened.lock().push(OpenedAttempt {
            attempt: request.attempt,
            url: request.url,
            events: request.events,
            close_rx,
        });
        let task = if self.hang_on_close {
            tokio::spawn(std::future::pending::<()>())
        } else {
            tokio::spawn(async {})
        };
        TransportHandle::new(close_tx, task)
    }
}
