//! Nullable audit sink: records entries in memory.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use vouch_store::{AuditSink, StoreError};

/// An in-memory audit sink with failure injection.
pub struct NullAuditSink {
    lines: Mutex<Vec<String>>,
    always_fail: AtomicBool,
    fail_next: AtomicU32,
}

impl NullAuditSink {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            always_fail: AtomicBool::new(false),
            fail_next: AtomicU32::new(0),
        }
    }

    /// Fail every append until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `n` appends, then recover.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// All accepted lines, in append order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// All accepted lines parsed as JSON.
    pub fn entries(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

impl Default for NullAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for NullAuditSink {
    fn append(&self, line: &str) -> Result<(), StoreError> {
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null audit sink: injected failure".into()));
        }
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::Backend("null audit sink: injected failure".into()));
        }
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}
