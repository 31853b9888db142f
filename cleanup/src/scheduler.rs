//! Interval-driven sweep task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::Sweeper;

pub struct CleanupScheduler;

impl CleanupScheduler {
    /// Sweep every `interval`, starting immediately, until `shutdown` fires.
    ///
    /// Sweeps run on the blocking pool since store access is synchronous.
    /// A sweep that is already running finishes before the task exits.
    pub fn spawn(
        sweeper: Arc<Sweeper>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => {
                        tracing::info!("cleanup scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sweeper = Arc::clone(&sweeper);
                        if let Err(e) = tokio::task::spawn_blocking(move || sweeper.sweep()).await {
                            tracing::warn!(error = %e, "sweep task failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CleanupConfig;
    use vouch_audit::{AuditConfig, AuditLogger};
    use vouch_nullables::{NullAuditSink, NullClock, NullTokenStore};

    #[tokio::test]
    async fn sweeps_until_shutdown() {
        let sink = Arc::new(NullAuditSink::new());
        let (audit, _writer) = AuditLogger::spawn(sink.clone(), AuditConfig::default());
        let sweeper = Arc::new(Sweeper::new(
            Arc::new(NullTokenStore::new()),
            Arc::new(NullClock::new(1_000)),
            audit.clone(),
            CleanupConfig::default(),
            5,
        ));
        let (tx, rx) = broadcast::channel(1);
        let handle = CleanupScheduler::spawn(sweeper, Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();
        audit.flush().await.unwrap();

        let sweeps = sink.entries().len();
        assert!(sweeps >= 2, "expected several sweeps, saw {sweeps}");

        // No further sweeps after shutdown.
        tokio::time::sleep(Duration::from_millis(50)).await;
        audit.flush().await.unwrap();
        assert_eq!(sink.entries().len(), sweeps);
    }
}
