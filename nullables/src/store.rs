//! Nullable store: concurrent in-memory token storage for testing.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use vouch_store::{StoreError, TokenStore};

/// An in-memory token + pending-submission store.
///
/// Backed by sharded maps, so operations on different keys do not contend
/// and a compare-and-swap holds only the shard lock of its own key. Reads
/// and writes can be made to fail on demand to exercise error paths.
pub struct NullTokenStore {
    tokens: DashMap<String, Vec<u8>>,
    submissions: DashMap<String, Vec<u8>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl NullTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
            submissions: DashMap::new(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent read fail with a backend error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Write a raw pending submission, bypassing the paired insert.
    pub fn put_submission(&self, key: &str, value: &[u8]) {
        self.submissions.insert(key.to_string(), value.to_vec());
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store: injected read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store: injected write failure".into()));
        }
        Ok(())
    }
}

impl Default for NullTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for NullTokenStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_read()?;
        Ok(self.tokens.get(key).map(|v| v.value().clone()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_write()?;
        self.tokens.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        self.check_write()?;
        match self.tokens.get_mut(key) {
            None => Err(StoreError::NotFound(key.to_string())),
            Some(mut current) => {
                if current.as_slice() != expected {
                    return Ok(false);
                }
                *current = new.to_vec();
                Ok(true)
            }
        }
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check_write()?;
        Ok(self.tokens.remove(key).is_some())
    }

    fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
        self.check_read()?;
        Ok(self.tokens.iter().map(|e| e.key().clone()).collect())
    }

    fn insert_pending(
        &self,
        key: &str,
        record: &[u8],
        submission: &[u8],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        match self.tokens.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(key.to_string())),
            Entry::Vacant(slot) => {
                if self.submissions.contains_key(key) {
                    return Err(StoreError::Duplicate(key.to_string()));
                }
                // The token shard stays locked until the submission is in.
                let _token = slot.insert(record.to_vec());
                self.submissions.insert(key.to_string(), submission.to_vec());
                Ok(())
            }
        }
    }

    fn get_submission(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_read()?;
        Ok(self.submissions.get(key).map(|v| v.value().clone()))
    }

    fn delete_submission(&self, key: &str) -> Result<bool, StoreError> {
        self.check_write()?;
        Ok(self.submissions.remove(key).is_some())
    }

    fn scan_submission_keys(&self) -> Result<Vec<String>, StoreError> {
        self.check_read()?;
        Ok(self.submissions.iter().map(|e| e.key().clone()).collect())
    }
}
