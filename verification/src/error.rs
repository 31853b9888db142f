use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token not found")]
    NotFound,

    #[error("token has already been used")]
    AlreadyUsed,

    #[error("invalid token request: {0}")]
    Validation(String),

    #[error("token storage failure: {0}")]
    Persistence(String),
}

impl TokenError {
    /// The caller-visible kind, for errors that describe the token itself.
    pub fn kind(&self) -> Option<TokenErrorKind> {
        match self {
            Self::NotFound => Some(TokenErrorKind::NotFound),
            Self::AlreadyUsed => Some(TokenErrorKind::AlreadyUsed),
            Self::Validation(_) | Self::Persistence(_) => None,
        }
    }
}

/// Why a token did not validate.
///
/// Reported in this order of precedence: a missing token wins over a used
/// one, a used one over an expired one, an expired one over one that ran out
/// of attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenErrorKind {
    NotFound,
    AlreadyUsed,
    Expired,
    TooManyAttempts,
}

impl TokenErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AlreadyUsed => "AlreadyUsed",
            Self::Expired => "Expired",
            Self::TooManyAttempts => "TooManyAttempts",
        }
    }
}

impl std::fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
