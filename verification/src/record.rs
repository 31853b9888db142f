//! The persisted token record and validation results.

use serde::{Deserialize, Serialize};
use vouch_types::{Email, ReviewId, Timestamp, TokenState};

use crate::{TokenError, TokenErrorKind};

/// A verification token as stored.
///
/// `used` only ever moves from false to true and `attempts` never decreases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    pub token: String,
    pub email: Email,
    pub review_id: ReviewId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub used: bool,
    pub attempts: u32,
}

impl VerificationToken {
    /// The lifecycle state at `now`.
    pub fn state(&self, now: Timestamp, max_attempts: u32) -> TokenState {
        if self.used {
            TokenState::Used
        } else if now > self.expires_at {
            TokenState::Expired
        } else if self.attempts >= max_attempts {
            TokenState::AttemptsExhausted
        } else {
            TokenState::Pending
        }
    }

    /// Why the token would not validate at `now`, if it would not.
    pub fn rejection(&self, now: Timestamp, max_attempts: u32) -> Option<TokenErrorKind> {
        match self.state(now, max_attempts) {
            TokenState::Pending => None,
            TokenState::Used => Some(TokenErrorKind::AlreadyUsed),
            TokenState::Expired => Some(TokenErrorKind::Expired),
            TokenState::AttemptsExhausted => Some(TokenErrorKind::TooManyAttempts),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, TokenError> {
        serde_json::to_vec(self).map_err(|e| TokenError::Persistence(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Outcome of a read-only token check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenValidation {
    pub valid: bool,
    /// The record, when one was found.
    pub record: Option<VerificationToken>,
    pub error: Option<TokenErrorKind>,
}

impl TokenValidation {
    pub fn valid(record: VerificationToken) -> Self {
        Self {
            valid: true,
            record: Some(record),
            error: None,
        }
    }

    pub fn invalid(error: TokenErrorKind, record: Option<VerificationToken>) -> Self {
        Self {
            valid: false,
            record,
            error: Some(error),
        }
    }

    pub fn not_found() -> Self {
        Self::invalid(TokenErrorKind::NotFound, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VerificationToken {
        VerificationToken {
            token: "ab".repeat(32),
            email: Email::parse("prof@school.edu").unwrap(),
            review_id: ReviewId::new("review-42"),
            created_at: Timestamp::from_secs(1_000),
            expires_at: Timestamp::from_secs(1_000).plus_hours(24),
            used: false,
            attempts: 0,
        }
    }

    #[test]
    fn wire_format_uses_camel_case_and_iso_timestamps() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["reviewId"], "review-42");
        assert_eq!(value["createdAt"], "1970-01-01T00:16:40.000Z");
        assert_eq!(value["expiresAt"], "1970-01-02T00:16:40.000Z");
        assert_eq!(value["used"], false);
        assert_eq!(value["attempts"], 0);

        let back = VerificationToken::decode(&record().encode().unwrap()).unwrap();
        assert_eq!(back, record());
    }

    #[test]
    fn expiry_is_inclusive() {
        let r = record();
        assert_eq!(r.rejection(r.expires_at, 5), None);
        assert_eq!(
            r.rejection(r.expires_at.plus_millis(1), 5),
            Some(TokenErrorKind::Expired)
        );
    }

    #[test]
    fn precedence_used_then_expired_then_attempts() {
        let mut r = record();
        r.used = true;
        r.attempts = 9;
        let late = r.expires_at.plus_secs(1);
        assert_eq!(r.rejection(late, 5), Some(TokenErrorKind::AlreadyUsed));

        r.used = false;
        assert_eq!(r.rejection(late, 5), Some(TokenErrorKind::Expired));
        assert_eq!(
            r.rejection(r.created_at, 5),
            Some(TokenErrorKind::TooManyAttempts)
        );
        r.attempts = 4;
        assert_eq!(r.state(r.created_at, 5), TokenState::Pending);
    }

    proptest::proptest! {
        #[test]
        fn valid_iff_unused_fresh_and_under_limit(
            used: bool,
            attempts in 0u32..10,
            offset_ms in 0u64..(48 * 3_600_000),
        ) {
            let mut r = record();
            r.used = used;
            r.attempts = attempts;
            let now = r.created_at.plus_millis(offset_ms);
            let expected = !used && attempts < 5 && now <= r.expires_at;
            proptest::prop_assert_eq!(r.rejection(now, 5).is_none(), expected);
        }
    }
}
