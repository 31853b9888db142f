//! Fundamental types for the Vouch review verification service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: timestamps and clocks, normalized email addresses, review
//! identifiers, the random-source abstraction and the fixed enumerations a
//! testimonial is described with.

pub mod email;
pub mod error;
pub mod random;
pub mod review;
pub mod state;
pub mod time;

pub use email::Email;
pub use error::TypesError;
pub use random::{OsRandom, RandomSource};
pub use review::{Relationship, ReviewId, ReviewStatus, SubmissionSource};
pub use state::TokenState;
pub use time::{Clock, SystemClock, Timestamp};
