//! Raw submission payload as posted by the portfolio front end.
//!
//! Every field defaults when absent so that a missing value surfaces as a
//! field-level validation error rather than a deserialization failure.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionInput {
    pub reviewer: ReviewerInput,
    pub content: ContentInput,
    pub source: Option<String>,
    pub status: Option<String>,
    /// Honeypot. Rendered hidden; a human leaves it empty.
    pub website: Option<String>,
    /// Client clock at submission time, Unix milliseconds.
    pub client_timestamp: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewerInput {
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub relationship: String,
    pub linkedin: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentInput {
    /// Kept loosely typed so `4.5` or `"5"` become validation errors.
    pub rating: serde_json::Value,
    pub testimonial: String,
    pub skills: Vec<String>,
    pub highlights: Vec<String>,
    pub project: Option<String>,
}
