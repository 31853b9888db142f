//! Keyed storage for verification token records and their pending submissions.
//!
//! Keys are token strings. Values are opaque serialized bytes; the
//! verification crate owns the record format. Token records and pending
//! submissions live in two separate keyspaces that share the same key.

use crate::StoreError;

/// Repository interface for token records and pending submissions.
///
/// All mutation of an existing token record must go through
/// [`TokenStore::compare_and_swap`] so concurrent read-modify-write cycles on
/// the same key cannot lose updates. Operations on different keys must not
/// contend with each other.
pub trait TokenStore: Send + Sync {
    /// Load the token record stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditionally write the token record under `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Replace the token record under `key` with `new` only if its current
    /// value equals `expected`.
    ///
    /// Returns `Ok(true)` when the swap happened, `Ok(false)` when the stored
    /// value differed, and `Err(StoreError::NotFound)` when the key is absent.
    fn compare_and_swap(&self, key: &str, expected: &[u8], new: &[u8])
        -> Result<bool, StoreError>;

    /// Remove the token record under `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Snapshot of every token key currently stored.
    fn scan_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Insert a token record together with its pending submission.
    ///
    /// Either both values become visible or neither does. Fails with
    /// `StoreError::Duplicate` if either keyspace already holds `key`.
    fn insert_pending(&self, key: &str, record: &[u8], submission: &[u8])
        -> Result<(), StoreError>;

    /// Load the pending submission stored under `key`.
    fn get_submission(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove the pending submission under `key`. Returns whether it existed.
    fn delete_submission(&self, key: &str) -> Result<bool, StoreError>;

    /// Snapshot of every pending-submission key currently stored.
    fn scan_submission_keys(&self) -> Result<Vec<String>, StoreError>;
}
