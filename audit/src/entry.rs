//! Audit entry types.
//!
//! Serialized as one JSON object per entry, tagged by `type`:
//!
//! ```json
//! {"type":"token","kind":"created","tokenPrefix":"3f9a0c1d","reviewId":"review-42",...}
//! {"type":"admin_action","action":"approve","reviewId":"review-42","performedBy":"sam",...}
//! {"type":"sweep","at":"2026-01-01T00:00:00.000Z","scanned":12,"expired":3,...}
//! ```

use serde::{Deserialize, Serialize};
use vouch_types::{Email, ReviewId, Timestamp};

/// Number of leading token characters that may appear in the trail.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// The loggable part of a token secret.
pub fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_LEN).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEntry {
    Token(TokenEvent),
    AdminAction(AdminActionLog),
    Sweep(SweepSummary),
}

impl AuditEntry {
    /// The `type` tag, for log fields.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::AdminAction(_) => "admin_action",
            Self::Sweep(_) => "sweep",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEventKind {
    Created,
    Verified,
    Used,
    AttemptFailed,
    Revoked,
    ValidationFailed,
}

/// One token lifecycle transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEvent {
    pub kind: TokenEventKind,
    pub token_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<ReviewId>,
    /// Attempt count after the transition, where relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Free-form detail: a revocation reason or a validation error kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: Timestamp,
}

impl TokenEvent {
    /// A bare event for `token`; the secret is cut down to its prefix here.
    pub fn new(kind: TokenEventKind, token: &str, at: Timestamp) -> Self {
        Self {
            kind,
            token_prefix: token_prefix(token),
            email: None,
            review_id: None,
            attempts: None,
            detail: None,
            at,
        }
    }

    pub fn with_subject(mut self, email: &Email, review_id: &ReviewId) -> Self {
        self.email = Some(email.clone());
        self.review_id = Some(review_id.clone());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Moderation actions an administrator can take on a review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Reject,
    Feature,
    Unfeature,
    Archive,
    Edit,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Feature => "feature",
            Self::Unfeature => "unfeature",
            Self::Archive => "archive",
            Self::Edit => "edit",
        }
    }
}

/// Immutable record of one administrative action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionLog {
    pub action: AdminAction,
    pub review_id: ReviewId,
    pub performed_by: String,
    pub performed_at: Timestamp,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source_address: Option<String>,
}

/// Totals from one cleanup sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub at: Timestamp,
    pub scanned: u64,
    pub expired: u64,
    pub aged_out: u64,
    pub corrupted: u64,
    pub orphans: u64,
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "3f9a0c1d5e7b2a4c6d8e0f1a3b5c7d9e1f2a4b6c8d0e2f4a6b8c0d2e4f6a8b0c";

    #[test]
    fn prefix_is_eight_chars() {
        assert_eq!(token_prefix(TOKEN), "3f9a0c1d");
        assert_eq!(token_prefix("abc"), "abc");
    }

    #[test]
    fn token_event_never_carries_full_secret() {
        let event = TokenEvent::new(TokenEventKind::Created, TOKEN, Timestamp::from_secs(1));
        let json = serde_json::to_string(&AuditEntry::Token(event)).unwrap();
        assert!(!json.contains(TOKEN));
        assert!(json.contains("\"tokenPrefix\":\"3f9a0c1d\""));
        assert!(json.contains("\"type\":\"token\""));
        assert!(json.contains("\"kind\":\"created\""));
    }

    #[test]
    fn admin_action_wire_format() {
        let entry = AuditEntry::AdminAction(AdminActionLog {
            action: AdminAction::Approve,
            review_id: ReviewId::new("review-42"),
            performed_by: "sam".into(),
            performed_at: Timestamp::from_secs(1_700_000_000),
            notes: Some("looks genuine".into()),
            source_address: Some("203.0.113.9".into()),
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "admin_action");
        assert_eq!(value["action"], "approve");
        assert_eq!(value["reviewId"], "review-42");
        assert_eq!(value["performedBy"], "sam");
        assert_eq!(value["performedAt"], "2023-11-14T22:13:20.000Z");
        assert_eq!(value["sourceAddress"], "203.0.113.9");

        let back: AuditEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
