//! # Cooperative Shutdown
//!
//! A cloneable stop flag paired with a [`Notify`] so idle waits wake as soon
//! as shutdown is requested. The poll loop only checks the flag between
//! messages; a dispatch already in flight always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct ShutdownState {
    triggered: AtomicBool,
    notify: Notify,
}

/// Shared stop signal for one or more poll loops
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.state.triggered.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.state.triggered.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a trigger in between is not lost
            notified.as_mut().enable();

            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless shutdown arrives first.
    ///
    /// Returns `true` when the sleep was cut short by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(duration) => self.is_triggered(),
            () = self.wait() => true,
        }
    }
}
