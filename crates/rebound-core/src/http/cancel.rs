//! Cooperative cancellation
//!
//! A [`CancelHandle`] is a shared flag. Cancelling it aborts the in-flight
//! attempt, interrupts any backoff or offline wait, and prevents further
//! attempts. Cancelling twice is harmless.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the handle is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only errs if it was dropped,
        // which cannot happen while we hold a reference.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancel after `delay` unless the returned task is aborted first.
    /// This is how callers put a deadline on a whole call.
    pub fn cancel_after(&self, delay: Duration) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(delay_ms = delay.as_millis() as u64, "deadline reached, cancelling");
            handle.cancel();
        })
    }
}

/// Resolves when `cancel` fires; never resolves when there is no handle
pub(crate) async fn cancelled(cancel: Option<&CancelHandle>) {
    match cancel {
        Some(handle) => handle.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Sleep for `delay`. Returns `false` if cancelled before the delay elapsed.
pub(crate) async fn sleep_unless_cancelled(delay: Duration, cancel: Option<&CancelHandle>) -> bool {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
