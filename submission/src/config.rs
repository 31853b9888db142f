//! Validator and rate-limiter configuration with TOML support.

use serde::{Deserialize, Serialize};

/// Limits applied by the [`crate::SubmissionValidator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Minimum testimonial length in characters, after trimming.
    #[serde(default = "default_min_testimonial_chars")]
    pub min_testimonial_chars: usize,

    /// Maximum testimonial length in characters, after trimming.
    #[serde(default = "default_max_testimonial_chars")]
    pub max_testimonial_chars: usize,

    #[serde(default = "default_max_skills")]
    pub max_skills: usize,

    #[serde(default = "default_max_highlights")]
    pub max_highlights: usize,

    /// How far the client-supplied timestamp may drift from server time.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Domain suffixes accepted for relationships that require a trusted
    /// (institutional) email address.
    #[serde(default = "default_trusted_domain_suffixes")]
    pub trusted_domain_suffixes: Vec<String>,
}

/// Fixed-window submission limit per identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_testimonial_chars() -> usize {
    50
}

fn default_max_testimonial_chars() -> usize {
    2000
}

fn default_max_skills() -> usize {
    10
}

fn default_max_highlights() -> usize {
    5
}

fn default_freshness_window_secs() -> u64 {
    300
}

fn default_trusted_domain_suffixes() -> Vec<String> {
    [
        ".edu", ".ac.uk", ".edu.au", ".ac.jp", ".ac.in", ".ac.nz", ".edu.sg", ".gov",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_submissions() -> u32 {
    3
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            min_testimonial_chars: default_min_testimonial_chars(),
            max_testimonial_chars: default_max_testimonial_chars(),
            max_skills: default_max_skills(),
            max_highlights: default_max_highlights(),
            freshness_window_secs: default_freshness_window_secs(),
            trusted_domain_suffixes: default_trusted_domain_suffixes(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_submissions: default_max_submissions(),
        }
    }
}
