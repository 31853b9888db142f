//! Verification tokens.
//!
//! A token is a 256-bit secret, hex encoded, issued together with the pending
//! submission it guards. It is valid while it is unused, has seen fewer than
//! `max_attempts` failed verification attempts and has not expired. Records
//! are only ever mutated through compare-and-swap, so concurrent requests on
//! the same token never lose an update and a token is consumed at most once.

pub mod config;
pub mod error;
pub mod generator;
pub mod record;
pub mod service;

pub use config::TokenConfig;
pub use error::{TokenError, TokenErrorKind};
pub use generator::{is_well_formed, TokenGenerator, TOKEN_BYTES, TOKEN_HEX_LEN};
pub use record::{TokenValidation, VerificationToken};
pub use service::{IssuedToken, TokenService, VerifyOutcome};
