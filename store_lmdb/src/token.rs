//! LMDB implementation of TokenStore.
//!
//! Token records and pending submissions live in two databases keyed by the
//! token string bytes. Compare-and-swap and the paired insert each run inside
//! a single write transaction.

use heed::types::Bytes;
use heed::{Database, RoTxn};

use vouch_store::{StoreError, TokenStore};

use crate::{LmdbEnvironment, LmdbError};

pub struct LmdbTokenStore {
    env: LmdbEnvironment,
}

impl LmdbTokenStore {
    pub(crate) fn new(env: LmdbEnvironment) -> Self {
        Self { env }
    }

    fn read(&self, db: Database<Bytes, Bytes>, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let val = db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .map(|b| b.to_vec());
        Ok(val)
    }

    fn remove(&self, db: Database<Bytes, Bytes>, key: &str) -> Result<bool, StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        let existed = db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn keys(&self, db: Database<Bytes, Bytes>) -> Result<Vec<String>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        collect_keys(db, &rtxn)
    }
}

fn collect_keys(db: Database<Bytes, Bytes>, rtxn: &RoTxn) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    for entry in db.iter(rtxn).map_err(LmdbError::from)? {
        let (key, _) = entry.map_err(LmdbError::from)?;
        match std::str::from_utf8(key) {
            Ok(k) => keys.push(k.to_string()),
            Err(_) => tracing::warn!(len = key.len(), "skipping non-utf8 key"),
        }
    }
    Ok(keys)
}

impl TokenStore for LmdbTokenStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read(self.env.tokens_db, key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        self.env
            .tokens_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        let matches = match self
            .env
            .tokens_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
        {
            None => return Err(StoreError::NotFound(key.to_string())),
            Some(current) => current == expected,
        };
        if !matches {
            // Dropping the transaction aborts it.
            return Ok(false);
        }
        self.env
            .tokens_db
            .put(&mut wtxn, key.as_bytes(), new)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.remove(self.env.tokens_db, key)
    }

    fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
        self.keys(self.env.tokens_db)
    }

    fn insert_pending(
        &self,
        key: &str,
        record: &[u8],
        submission: &[u8],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        let token_exists = self
            .env
            .tokens_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        let submission_exists = self
            .env
            .submissions_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if token_exists || submission_exists {
            return Err(StoreError::Duplicate(key.to_string()));
        }
        self.env
            .tokens_db
            .put(&mut wtxn, key.as_bytes(), record)
            .map_err(LmdbError::from)?;
        self.env
            .submissions_db
            .put(&mut wtxn, key.as_bytes(), submission)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_submission(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read(self.env.submissions_db, key)
    }

    fn delete_submission(&self, key: &str) -> Result<bool, StoreError> {
        self.remove(self.env.submissions_db, key)
    }

    fn scan_submission_keys(&self) -> Result<Vec<String>, StoreError> {
        self.keys(self.env.submissions_db)
    }
}
