//! Queued audit writer.
//!
//! [`AuditLogger`] is a cheap cloneable handle. `append` pushes onto a bounded
//! channel with `try_send` and returns immediately; a single background task
//! drains the channel into the sink, retrying each entry a bounded number of
//! times with linear backoff. Sink writes block, so they run on the blocking
//! pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use vouch_store::AuditSink;

use crate::{AdminActionLog, AuditConfig, AuditEntry, AuditError};

enum Command {
    Write(AuditEntry),
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
struct AuditStats {
    written: AtomicU64,
    failures: AtomicU64,
}

#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<Command>,
    stats: Arc<AuditStats>,
}

impl AuditLogger {
    /// Start the writer task for `sink`. Must be called inside a tokio
    /// runtime. The task exits once every handle has been dropped and the
    /// queue is drained.
    pub fn spawn(sink: Arc<dyn AuditSink>, config: AuditConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let stats = Arc::new(AuditStats::default());
        let writer = Writer {
            sink,
            stats: Arc::clone(&stats),
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        };
        let handle = tokio::spawn(writer.run(rx));
        (Self { tx, stats }, handle)
    }

    /// Queue `entry` for writing without waiting.
    ///
    /// On error the entry is lost; the failure has already been logged and
    /// counted, so callers on a primary path may ignore the result.
    pub fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let kind = entry.type_name();
        match self.tx.try_send(Command::Write(entry)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(entry = kind, "audit queue full, entry dropped");
                Err(AuditError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(entry = kind, "audit writer stopped, entry dropped");
                Err(AuditError::Closed)
            }
        }
    }

    /// Record one administrative action.
    pub fn record_admin_action(&self, log: AdminActionLog) -> Result<(), AuditError> {
        tracing::info!(
            action = log.action.as_str(),
            review_id = %log.review_id,
            performed_by = %log.performed_by,
            "admin action"
        );
        self.append(AuditEntry::AdminAction(log))
    }

    /// Wait until every entry queued before this call has been processed,
    /// written or given up on.
    pub async fn flush(&self) -> Result<(), AuditError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(done_tx))
            .await
            .map_err(|_| AuditError::Closed)?;
        done_rx.await.map_err(|_| AuditError::Closed)
    }

    /// Entries the sink accepted.
    pub fn written(&self) -> u64 {
        self.stats.written.load(Ordering::Relaxed)
    }

    /// Entries lost to a full queue, a stopped writer or exhausted retries.
    pub fn failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }
}

struct Writer {
    sink: Arc<dyn AuditSink>,
    stats: Arc<AuditStats>,
    max_attempts: u32,
    backoff: Duration,
}

impl Writer {
    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Write(entry) => self.write(&entry).await,
                Command::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("audit writer stopped");
    }

    async fn write(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "failed to serialize audit entry");
                return;
            }
        };

        let line: Arc<str> = line.into();
        for attempt in 1..=self.max_attempts {
            let sink = Arc::clone(&self.sink);
            let pending = Arc::clone(&line);
            let outcome = match tokio::task::spawn_blocking(move || sink.append(&pending)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("sink task failed: {e}")),
            };
            match outcome {
                Ok(()) => {
                    self.stats.written.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::debug!(attempt, error = %e, "audit write failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => {
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        entry = entry.type_name(),
                        attempts = attempt,
                        error = %e,
                        "audit entry lost after retries"
                    );
                }
            }
        }
    }
}
