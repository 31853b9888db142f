//! LMDB storage backend for the Vouch service.
//!
//! Implements the storage traits from `vouch-store` using the `heed` LMDB
//! bindings. Token records, pending submissions and the audit trail each map
//! to one named database within a single environment. LMDB serializes write
//! transactions, so every read-compare-write performed inside one write
//! transaction is atomic.

pub mod audit;
pub mod environment;
pub mod error;
pub mod token;

pub use audit::LmdbAuditSink;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use token::LmdbTokenStore;
