use serde::Serialize;
use thiserror::Error;

/// One failed structural check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Which content heuristic flagged a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionReason {
    RepeatedCharacters,
    EmbeddedUrl,
    CurrencyAmount,
    CommercialLanguage,
}

impl SuspicionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepeatedCharacters => "repeated_characters",
            Self::EmbeddedUrl => "embedded_url",
            Self::CurrencyAmount => "currency_amount",
            Self::CommercialLanguage => "commercial_language",
        }
    }
}

/// Why a submission was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionRejection {
    #[error("submission failed validation ({} error(s))", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("content flagged as suspicious: {}", .0.as_str())]
    ContentSuspicious(SuspicionReason),

    #[error("email domain {0} is not trusted for this relationship")]
    UntrustedDomain(String),

    /// The honeypot fired. Callers must answer exactly as they would for an
    /// accepted submission.
    #[error("submission rejected")]
    SpamDetected,
}

impl SubmissionRejection {
    /// Stable, caller-visible name of the rejection kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "ValidationError",
            Self::ContentSuspicious(_) => "ContentSuspicious",
            Self::UntrustedDomain(_) => "UntrustedDomain",
            Self::SpamDetected => "SpamDetected",
        }
    }
}

/// Too many submissions from one identifier inside the current window.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rate limited, retry after {retry_after_ms}ms")]
pub struct RateLimited {
    /// Milliseconds until the window resets. Always positive.
    pub retry_after_ms: u64,
}

impl RateLimited {
    /// Whole seconds to wait, rounded up, for a `Retry-After` header.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_ms.div_ceil(1_000)
    }
}
