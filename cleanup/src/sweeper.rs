//! One cleanup pass over the token store.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vouch_audit::{token_prefix, AuditEntry, AuditLogger, SweepSummary};
use vouch_store::TokenStore;
use vouch_types::{Clock, Timestamp};
use vouch_verification::VerificationToken;

use crate::CleanupConfig;

/// Counts from one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Token keys in the snapshot.
    pub scanned: u64,
    /// Deleted for being past `expiresAt` plus grace.
    pub expired: u64,
    /// Deleted for exceeding the hard maximum age.
    pub aged_out: u64,
    /// Deleted for being undecodable.
    pub corrupted: u64,
    /// Pending submissions deleted because their token was gone.
    pub orphans: u64,
    /// Store operations that failed; the affected records are left for the
    /// next sweep.
    pub errors: u64,
}

impl SweepReport {
    pub fn removed(&self) -> u64 {
        self.expired + self.aged_out + self.corrupted
    }

    pub fn to_summary(&self, at: Timestamp) -> SweepSummary {
        SweepSummary {
            at,
            scanned: self.scanned,
            expired: self.expired,
            aged_out: self.aged_out,
            corrupted: self.corrupted,
            orphans: self.orphans,
            errors: self.errors,
        }
    }
}

enum Verdict {
    Keep,
    Expired,
    AgedOut,
    Corrupted,
}

pub struct Sweeper {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    audit: AuditLogger,
    config: CleanupConfig,
    max_attempts: u32,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        audit: AuditLogger,
        config: CleanupConfig,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            clock,
            audit,
            config,
            max_attempts,
        }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Run one sweep and record its summary in the audit trail.
    ///
    /// Both key snapshots are taken before anything is deleted, so records
    /// created while the sweep runs are never visited.
    pub fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let snapshot = self
            .store
            .scan_keys()
            .and_then(|tokens| Ok((tokens, self.store.scan_submission_keys()?)));
        match snapshot {
            Ok((tokens, submissions)) => {
                report.scanned = tokens.len() as u64;
                for key in &tokens {
                    self.visit_token(key, now, &mut report);
                }
                for key in &submissions {
                    self.visit_submission(key, &mut report);
                }
            }
            Err(e) => {
                warn!(error = %e, "sweep could not snapshot the store");
                report.errors += 1;
            }
        }

        info!(
            scanned = report.scanned,
            expired = report.expired,
            aged_out = report.aged_out,
            corrupted = report.corrupted,
            orphans = report.orphans,
            errors = report.errors,
            "sweep complete"
        );
        let _ = self
            .audit
            .append(AuditEntry::Sweep(report.to_summary(now)));
        report
    }

    fn verdict(&self, bytes: &[u8], now: Timestamp) -> Verdict {
        let record = match VerificationToken::decode(bytes) {
            Ok(record) => record,
            Err(_) => return Verdict::Corrupted,
        };
        if now > record.expires_at.plus_secs(self.config.grace_secs) {
            return Verdict::Expired;
        }
        // A record that can still validate is never removed for age.
        let still_valid = record.rejection(now, self.max_attempts).is_none();
        let max_age_ms = self.config.max_age_secs.saturating_mul(1_000);
        if !still_valid && record.created_at.elapsed_since(now) > max_age_ms {
            return Verdict::AgedOut;
        }
        Verdict::Keep
    }

    fn visit_token(&self, key: &str, now: Timestamp, report: &mut SweepReport) {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            // Deleted since the snapshot.
            Ok(None) => return,
            Err(e) => {
                debug!(token = %token_prefix(key), error = %e, "sweep read failed");
                report.errors += 1;
                return;
            }
        };

        let verdict = self.verdict(&bytes, now);
        let counter = match verdict {
            Verdict::Keep => return,
            Verdict::Expired => &mut report.expired,
            Verdict::AgedOut => &mut report.aged_out,
            Verdict::Corrupted => &mut report.corrupted,
        };

        match self.store.delete(key) {
            Ok(true) => *counter += 1,
            Ok(false) => return,
            Err(e) => {
                warn!(token = %token_prefix(key), error = %e, "sweep delete failed");
                report.errors += 1;
                return;
            }
        }
        // A failure here leaves an orphan for the next sweep.
        if let Err(e) = self.store.delete_submission(key) {
            warn!(token = %token_prefix(key), error = %e, "failed to delete pending submission");
            report.errors += 1;
        }
    }

    fn visit_submission(&self, key: &str, report: &mut SweepReport) {
        match self.store.get(key) {
            Ok(Some(_)) => {}
            Ok(None) => match self.store.delete_submission(key) {
                Ok(true) => report.orphans += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(token = %token_prefix(key), error = %e, "orphan delete failed");
                    report.errors += 1;
                }
            },
            Err(e) => {
                debug!(token = %token_prefix(key), error = %e, "sweep read failed");
                report.errors += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vouch_audit::AuditConfig;
    use vouch_nullables::{NullAuditSink, NullClock, NullRandom, NullTokenStore};
    use vouch_store::StoreError;
    use vouch_types::{Email, ReviewId};
    use vouch_verification::{TokenConfig, TokenErrorKind, TokenGenerator, TokenService};

    const NOW_SECS: u64 = 1_760_000_000;
    const HOUR: u64 = 3_600;

    struct Harness {
        sweeper: Sweeper,
        store: Arc<NullTokenStore>,
        clock: Arc<NullClock>,
        sink: Arc<NullAuditSink>,
        audit: AuditLogger,
    }

    fn harness() -> Harness {
        let store = Arc::new(NullTokenStore::new());
        let clock = Arc::new(NullClock::new(NOW_SECS));
        let sink = Arc::new(NullAuditSink::new());
        let (audit, _handle) = AuditLogger::spawn(sink.clone(), AuditConfig::default());
        let sweeper = Sweeper::new(
            store.clone(),
            clock.clone(),
            audit.clone(),
            CleanupConfig::default(),
            5,
        );
        Harness {
            sweeper,
            store,
            clock,
            sink,
            audit,
        }
    }

    /// Insert a record created `age_hours` ago with the given TTL.
    fn insert(h: &Harness, key: &str, age_hours: u64, ttl_hours: u64, used: bool, attempts: u32) {
        h.store
            .insert_pending(key, &record(key, age_hours, ttl_hours, used, attempts), b"{}")
            .unwrap();
    }

    fn record(key: &str, age_hours: u64, ttl_hours: u64, used: bool, attempts: u32) -> Vec<u8> {
        let created_at = Timestamp::from_secs(NOW_SECS - age_hours * HOUR);
        let record = VerificationToken {
            token: key.to_string(),
            email: Email::parse("a@b.org").unwrap(),
            review_id: ReviewId::new(format!("review-{key}")),
            created_at,
            expires_at: created_at.plus_hours(ttl_hours),
            used,
            attempts,
        };
        record.encode().unwrap()
    }

    fn token_key(n: u64) -> String {
        format!("{n:064x}")
    }

    /// Delegates to a `NullTokenStore`, inserting one more record right after
    /// the first token snapshot is taken.
    struct InsertAfterSnapshot {
        inner: Arc<NullTokenStore>,
        late: Mutex<Option<(String, Vec<u8>)>>,
    }

    impl TokenStore for InsertAfterSnapshot {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
            self.inner.put(key, value)
        }

        fn compare_and_swap(
            &self,
            key: &str,
            expected: &[u8],
            new: &[u8],
        ) -> Result<bool, StoreError> {
            self.inner.compare_and_swap(key, expected, new)
        }

        fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.delete(key)
        }

        fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
            let keys = self.inner.scan_keys()?;
            if let Some((key, record)) = self.late.lock().unwrap().take() {
                self.inner.insert_pending(&key, &record, b"{}")?;
            }
            Ok(keys)
        }

        fn insert_pending(
            &self,
            key: &str,
            record: &[u8],
            submission: &[u8],
        ) -> Result<(), StoreError> {
            self.inner.insert_pending(key, record, submission)
        }

        fn get_submission(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get_submission(key)
        }

        fn delete_submission(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.delete_submission(key)
        }

        fn scan_submission_keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.scan_submission_keys()
        }
    }

    fn token_service(h: &Harness) -> TokenService {
        TokenService::new(
            h.store.clone(),
            h.clock.clone(),
            TokenGenerator::new(Arc::new(NullRandom::new())),
            h.audit.clone(),
            TokenConfig::default(),
        )
    }

    #[tokio::test]
    async fn removes_only_dead_records() {
        let h = harness();
        insert(&h, "fresh", 1, 24, false, 0);
        insert(&h, "within-grace", 24, 24, false, 0);
        insert(&h, "expired", 26, 24, false, 0);
        insert(&h, "used-recent", 2, 24, true, 0);

        let report = h.sweeper.sweep();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.expired, 1);
        assert_eq!(report.removed(), 1);
        assert!(h.store.get("expired").unwrap().is_none());
        assert!(h.store.get_submission("expired").unwrap().is_none());
        for kept in ["fresh", "within-grace", "used-recent"] {
            assert!(h.store.get(kept).unwrap().is_some(), "{kept}");
            assert!(h.store.get_submission(kept).unwrap().is_some(), "{kept}");
        }
    }

    #[tokio::test]
    async fn hard_max_age_ignores_expiry_for_dead_tokens() {
        let h = harness();
        // Long TTL, so expiry never triggers within the test.
        insert(&h, "old-used", 8 * 24, 30 * 24, true, 0);
        insert(&h, "old-locked", 8 * 24, 30 * 24, false, 5);
        insert(&h, "old-valid", 8 * 24, 30 * 24, false, 4);

        let report = h.sweeper.sweep();
        assert_eq!(report.aged_out, 2);
        assert!(h.store.get("old-used").unwrap().is_none());
        assert!(h.store.get("old-locked").unwrap().is_none());
        assert!(h.store.get("old-valid").unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_records_and_orphans_are_removed() {
        let h = harness();
        h.store.insert_pending("junk", b"\xff\x00", b"{}").unwrap();
        h.store.put_submission("orphan", b"{}");
        insert(&h, "fresh", 1, 24, false, 0);

        let report = h.sweeper.sweep();
        assert_eq!(report.corrupted, 1);
        assert_eq!(report.orphans, 1);
        assert_eq!(h.store.token_count(), 1);
        assert_eq!(h.store.submission_count(), 1);
    }

    #[tokio::test]
    async fn never_removes_a_valid_token_at_any_point_before_expiry() {
        let h = harness();
        insert(&h, "live", 0, 24, false, 4);
        for _ in 0..24 {
            h.clock.advance(HOUR);
            assert_eq!(h.sweeper.sweep().removed(), 0);
        }
        assert!(h.store.get("live").unwrap().is_some());
    }

    #[tokio::test]
    async fn store_failure_is_counted_not_fatal() {
        let h = harness();
        insert(&h, "expired", 30, 24, false, 0);
        h.store.set_fail_writes(true);
        let report = h.sweeper.sweep();
        assert_eq!(report.expired, 0);
        assert_eq!(report.errors, 1);
        assert!(h.store.get("expired").unwrap().is_some());

        h.store.set_fail_reads(true);
        let report = h.sweeper.sweep();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.errors, 1);
    }

    #[tokio::test]
    async fn one_audit_summary_per_sweep() {
        let h = harness();
        insert(&h, "a", 30, 24, false, 0);
        insert(&h, "b", 30, 24, false, 0);
        h.sweeper.sweep();
        h.sweeper.sweep();
        h.audit.flush().await.unwrap();

        let entries = h.sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["type"] == "sweep"));
        assert_eq!(entries[0]["expired"], 2);
        assert_eq!(entries[1]["expired"], 0);
    }

    #[tokio::test]
    async fn records_inserted_after_the_snapshot_are_left_alone() {
        let h = harness();
        insert(&h, "expired", 30, 24, false, 0);
        // Already expired, so it would be deleted if the sweep saw it.
        let store = Arc::new(InsertAfterSnapshot {
            inner: h.store.clone(),
            late: Mutex::new(Some(("late".to_string(), record("late", 30, 24, false, 0)))),
        });
        let sweeper = Sweeper::new(
            store,
            h.clock.clone(),
            h.audit.clone(),
            CleanupConfig::default(),
            5,
        );

        let report = sweeper.sweep();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.expired, 1);
        assert_eq!(report.orphans, 0);
        assert!(h.store.get("expired").unwrap().is_none());
        assert!(h.store.get("late").unwrap().is_some());
        assert!(h.store.get_submission("late").unwrap().is_some());

        // The next sweep snapshots it like any other record.
        assert_eq!(h.sweeper.sweep().expired, 1);
        assert!(h.store.get("late").unwrap().is_none());
    }

    #[tokio::test]
    async fn swept_token_validates_as_not_found() {
        let h = harness();
        let service = token_service(&h);
        let key = token_key(7);
        insert(&h, &key, 30, 24, false, 0);

        assert_eq!(service.validate_token(&key).error, Some(TokenErrorKind::Expired));
        assert_eq!(h.sweeper.sweep().expired, 1);
        let after = service.validate_token(&key);
        assert!(!after.valid);
        assert!(after.record.is_none());
        assert_eq!(after.error, Some(TokenErrorKind::NotFound));
    }

    #[tokio::test]
    async fn sweep_racing_validation_only_ever_surfaces_not_found() {
        let h = harness();
        let service = token_service(&h);
        let keys: Vec<String> = (0..64).map(token_key).collect();
        for key in &keys {
            insert(&h, key, 30, 24, false, 0);
        }

        std::thread::scope(|scope| {
            scope.spawn(|| h.sweeper.sweep());
            for _ in 0..4 {
                for key in &keys {
                    let v = service.validate_token(key);
                    assert!(!v.valid);
                    assert!(
                        matches!(
                            v.error,
                            Some(TokenErrorKind::Expired) | Some(TokenErrorKind::NotFound)
                        ),
                        "{key}: {:?}",
                        v.error
                    );
                }
            }
        });

        for key in &keys {
            assert_eq!(service.validate_token(key).error, Some(TokenErrorKind::NotFound));
        }
    }
}
