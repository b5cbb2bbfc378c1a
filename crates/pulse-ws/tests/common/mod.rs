//! Shared helpers for pulse-ws integration tests.

#![allow(dead_code)]

pub mod fake_connector;
pub mod mock_stream;

use pulse_ws::StreamSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_for_snapshot<F>(
    rx: &mut watch::Receiver<Arc<StreamSnapshot>>,
    pred: F,
) -> Arc<StreamSnapshot>
where
    F: Fn(&StreamSnapshot) -> bool,
{
    timeout(Duration::from_secs(30), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return snapshot;
            }
            rx.changed().await.expect("controller should be running");
        }
    })
    .await
    .expect("snapshot condition should be met within timeout")
}

/// Poll `check` until it returns true or the timeout elapses.
pub async fn wait_until<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    timeout(limit, async {
        loop {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}
