//! Append-only audit sink trait.

use crate::StoreError;

/// Destination for serialized audit entries.
///
/// Implementations only ever append; accepted entries are never updated or
/// deleted.
pub trait AuditSink: Send + Sync {
    /// Append one serialized entry (a single JSON object, no trailing newline).
    fn append(&self, line: &str) -> Result<(), StoreError>;
}
