//! Append-only audit trail.
//!
//! Every token lifecycle transition, administrative action and cleanup sweep
//! is recorded as one immutable JSON object. Entries are queued by
//! [`AuditLogger`] and written by a background task to an
//! [`AuditSink`](vouch_store::AuditSink) with bounded retry. A failed write
//! never fails the operation that produced the entry: it is logged and
//! counted instead.

pub mod config;
pub mod entry;
pub mod error;
pub mod file;
pub mod logger;

pub use config::AuditConfig;
pub use entry::{
    token_prefix, AdminAction, AdminActionLog, AuditEntry, SweepSummary, TokenEvent,
    TokenEventKind, TOKEN_PREFIX_LEN,
};
pub use error::AuditError;
pub use file::FileAuditSink;
pub use logger::AuditLogger;
