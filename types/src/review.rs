//! Review identifiers and the fixed enumerations describing a testimonial.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Identifier of a submitted review, e.g. `review-42`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// A fresh random identifier of the form `review-<uuid>`.
    pub fn generate() -> Self {
        Self(format!("review-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReviewId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How the reviewer knows the site owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Colleague,
    Manager,
    DirectReport,
    Client,
    Mentor,
    AcademicSupervisor,
    Professor,
    Classmate,
    Collaborator,
    Other,
}

impl Relationship {
    pub const ALL: [Relationship; 10] = [
        Self::Colleague,
        Self::Manager,
        Self::DirectReport,
        Self::Client,
        Self::Mentor,
        Self::AcademicSupervisor,
        Self::Professor,
        Self::Classmate,
        Self::Collaborator,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colleague => "colleague",
            Self::Manager => "manager",
            Self::DirectReport => "direct_report",
            Self::Client => "client",
            Self::Mentor => "mentor",
            Self::AcademicSupervisor => "academic_supervisor",
            Self::Professor => "professor",
            Self::Classmate => "classmate",
            Self::Collaborator => "collaborator",
            Self::Other => "other",
        }
    }

    /// Relationships that imply elevated trust and therefore require the
    /// reviewer's email to belong to an institutional domain.
    pub fn requires_trusted_domain(&self) -> bool {
        matches!(self, Self::AcademicSupervisor | Self::Professor)
    }
}

impl FromStr for Relationship {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| TypesError::UnknownVariant {
                kind: "relationship",
                value: s.to_string(),
            })
    }
}

/// Where the submission came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionSource {
    Website,
    Linkedin,
    Email,
    Referral,
    Other,
}

impl SubmissionSource {
    pub const ALL: [SubmissionSource; 5] = [
        Self::Website,
        Self::Linkedin,
        Self::Email,
        Self::Referral,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Linkedin => "linkedin",
            Self::Email => "email",
            Self::Referral => "referral",
            Self::Other => "other",
        }
    }
}

impl FromStr for SubmissionSource {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| TypesError::UnknownVariant {
                kind: "source",
                value: s.to_string(),
            })
    }
}

/// Moderation status of a review.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Featured,
    Archived,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Featured,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Featured => "featured",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| TypesError::UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}
