//! Validated, normalized submission content.

use serde::{Deserialize, Serialize};
use vouch_types::{Email, Relationship, ReviewStatus, SubmissionSource, Timestamp};

/// A submission that cleared every validation stage.
///
/// This is the pending-submission payload stored alongside a verification
/// token until the reviewer proves control of `reviewer.email`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedSubmission {
    pub reviewer: ReviewerProfile,
    pub testimonial: Testimonial,
    pub source: SubmissionSource,
    pub status: ReviewStatus,
    /// Client-reported submission instant (already checked for freshness).
    pub submitted_at: Timestamp,
    /// Whether the email domain matched the trusted allow-list.
    pub trusted_domain: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerProfile {
    pub name: String,
    pub email: Email,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub relationship: Relationship,
    pub linkedin: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub rating: u8,
    pub text: String,
    pub skills: Vec<String>,
    pub highlights: Vec<String>,
    pub project: Option<String>,
}
