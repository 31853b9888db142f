//! Submission validation for public testimonials.
//!
//! A submission passes through, in order:
//! 1. **Honeypot**: a hidden field humans never fill. Trips silently.
//! 2. **Structural checks**: ranges, lengths, enumerations, freshness of
//!    the client timestamp. All failures are collected.
//! 3. **Content heuristics**: repeated characters, URLs, currency amounts,
//!    commercial language.
//! 4. **Trusted-domain mode**: relationships implying elevated trust need an
//!    institutional email domain.
//!
//! Only a submission that clears every stage is turned into a
//! [`SanitizedSubmission`], which is what the token issuer persists.
//! Submission volume per identifier is bounded separately by
//! [`SubmissionRateLimiter`].

pub mod config;
pub mod error;
pub mod heuristics;
pub mod input;
pub mod rate_limit;
pub mod sanitized;
pub mod trusted;
pub mod validator;

pub use config::{RateLimitConfig, SubmissionConfig};
pub use error::{FieldError, RateLimited, SubmissionRejection, SuspicionReason};
pub use input::{ContentInput, ReviewerInput, SubmissionInput};
pub use rate_limit::SubmissionRateLimiter;
pub use sanitized::{ReviewerProfile, SanitizedSubmission, Testimonial};
pub use trusted::TrustedDomains;
pub use validator::SubmissionValidator;
