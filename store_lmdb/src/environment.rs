//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbAuditSink, LmdbError, LmdbTokenStore};

/// Number of named databases the environment is opened with.
const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) tokens_db: Database<Bytes, Bytes>,
    pub(crate) submissions_db: Database<Bytes, Bytes>,
    pub(crate) audit_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment in the directory `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; the
        // same path is never opened twice concurrently within it.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let tokens_db = env.create_database(&mut wtxn, Some("tokens"))?;
        let submissions_db = env.create_database(&mut wtxn, Some("submissions"))?;
        let audit_db = env.create_database(&mut wtxn, Some("audit"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            tokens_db,
            submissions_db,
            audit_db,
        })
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    /// A token store backed by this environment.
    pub fn token_store(&self) -> LmdbTokenStore {
        LmdbTokenStore::new(self.clone())
    }

    /// An audit sink backed by this environment.
    pub fn audit_sink(&self) -> LmdbAuditSink {
        LmdbAuditSink::new(self.clone())
    }
}
