//! Lifecycle state of a verification token.

use serde::{Deserialize, Serialize};

/// The state of a verification token as observed at a given instant.
///
/// Only `used` and `attempts` are stored; `Expired` and `AttemptsExhausted`
/// are derived from the clock and the attempt counter at the time of the
/// question. Every state other than `Pending` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Issued and still usable.
    Pending,
    /// Consumed by a successful verification, or revoked by an administrator.
    Used,
    /// Past its expiry instant.
    Expired,
    /// Too many failed verification attempts.
    AttemptsExhausted,
}

impl TokenState {
    /// Whether the token can still be used to verify a submission.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::AttemptsExhausted => "attempts_exhausted",
        }
    }
}
