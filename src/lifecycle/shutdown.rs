//! Shutdown coordination.

use tokio::sync::broadcast;

/// Fan-out shutdown signal for the server and the change watcher.
///
/// Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that resolves once [`trigger`](Self::trigger) is called.
    ///
    /// Subscribe before triggering; later subscribers miss the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Safe to call more than once.
    pub fn trigger(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners, "Shutdown triggered");
    }

    /// Tasks still listening.
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
