//! Abstract storage traits for the Vouch service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits, and receives
//! a concrete backend by injection at construction time.

pub mod audit;
pub mod error;
pub mod token;

pub use audit::AuditSink;
pub use error::StoreError;
pub use token::TokenStore;
