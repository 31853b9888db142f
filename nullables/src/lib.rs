//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, random source, token storage, audit
//! sink) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod audit;
pub mod clock;
pub mod random;
pub mod store;

pub use audit::NullAuditSink;
pub use clock::NullClock;
pub use random::NullRandom;
pub use store::NullTokenStore;
