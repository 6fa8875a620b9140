//! Shutdown coordination for the proxy.

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_signal;

/// Fan-out handle for graceful shutdown.
///
/// The HTTP server holds a receiver from [`Shutdown::subscribe`]. Any clone
/// can fire the signal, so the OS signal watcher and tests share one handle.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Fire the signal on SIGINT/SIGTERM from a background task.
    pub fn trigger_on_os_signal(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            handle.trigger();
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
