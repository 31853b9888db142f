//! Parse errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("random source failure: {0}")]
    Random(String),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
