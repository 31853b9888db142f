use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Audit logger settings, the `[audit]` section of the daemon config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Entries that may wait for the writer before `append` starts failing.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Write attempts per entry, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before retry `n` is `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// JSON-lines file to append to. When unset the storage backend's own
    /// audit database is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            path: None,
        }
    }
}
