//! Process-wide shutdown signal for the daemon.
//!
//! The HTTP server, the cleanup scheduler and other background tasks each
//! hold a receiver and stop when the controller fires, whether from
//! SIGINT/SIGTERM or a failing subsystem.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;

/// The OS signal that started shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A receiver notified on shutdown. Subscribe before the task starts;
    /// use [`ShutdownController::fired`] to catch a shutdown that already
    /// happened.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown signal. Later calls do nothing.
    pub fn shutdown(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has fired, immediately if it already has.
    pub async fn fired(&self) {
        let mut rx = self.subscribe();
        if self.is_fired() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Wait for SIGINT or SIGTERM, then fire. Returns early with `None` if
    /// shutdown is fired some other way first.
    pub async fn wait_for_signal(&self) -> Option<Signal> {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let received = tokio::select! {
            _ = signal::ctrl_c() => Signal::Interrupt,
            _ = terminate => Signal::Terminate,
            _ = self.fired() => return None,
        };
        tracing::info!(signal = ?received, "shutdown requested");
        self.shutdown();
        Some(received)
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
