//! LMDB implementation of AuditSink.
//!
//! Entries are keyed by a big-endian `u64` sequence number so iteration order
//! is append order. The next sequence number is derived from the last key
//! inside the same write transaction that stores the entry.

use vouch_store::{AuditSink, StoreError};

use crate::{LmdbEnvironment, LmdbError};

pub struct LmdbAuditSink {
    env: LmdbEnvironment,
}

impl LmdbAuditSink {
    pub(crate) fn new(env: LmdbEnvironment) -> Self {
        Self { env }
    }

    /// Read back every entry in append order.
    pub fn entries(&self) -> Result<Vec<String>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.env.audit_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_seq, value) = entry.map_err(LmdbError::from)?;
            let line = std::str::from_utf8(value)
                .map_err(|e| StoreError::Corruption(format!("audit entry: {e}")))?;
            out.push(line.to_string());
        }
        Ok(out)
    }

    /// Number of entries in the trail.
    pub fn len(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let count = self.env.audit_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl AuditSink for LmdbAuditSink {
    fn append(&self, line: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        let next = match self.env.audit_db.last(&wtxn).map_err(LmdbError::from)? {
            Some((key, _)) => {
                let bytes: [u8; 8] = key
                    .try_into()
                    .map_err(|_| StoreError::Corruption("audit key is not 8 bytes".into()))?;
                u64::from_be_bytes(bytes) + 1
            }
            None => 0,
        };
        self.env
            .audit_db
            .put(&mut wtxn, &next.to_be_bytes(), line.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
