//! Cooperative shutdown signal shared by the producers and the event loop.
//!
//! Producer threads poll [`ShutdownSignal::is_triggered`] once per tick or
//! line; the event loop awaits [`ShutdownSignal::triggered`] inside its
//! `select!`. Triggering is one-way.

use tokio::sync::watch;

/// Cloneable one-shot shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: watch::Sender<bool>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self { sender, receiver }
    }

    /// Requests shutdown. Further calls are no-ops.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Non-blocking check, safe to call from plain OS threads.
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
