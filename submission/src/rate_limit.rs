//! Fixed-window submission rate limiting.
//!
//! Each identifier (client address, normalized email) gets a window that
//! opens at its first submission and admits `max_submissions` within
//! `window_ms`. Windows live in a sharded map, so checks for different
//! identifiers do not contend.

use dashmap::DashMap;
use tracing::debug;
use vouch_types::Timestamp;

use crate::{RateLimitConfig, RateLimited};

struct Window {
    started_at: Timestamp,
    count: u32,
}

pub struct SubmissionRateLimiter {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
}

impl SubmissionRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record a submission from `identifier` at `now`.
    ///
    /// Rejected submissions are not counted against the window.
    pub fn check(&self, identifier: &str, now: Timestamp) -> Result<(), RateLimited> {
        let mut window = self
            .windows
            .entry(identifier.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        let elapsed = window.started_at.elapsed_since(now);
        if elapsed >= self.config.window_ms {
            window.started_at = now;
            window.count = 0;
        }

        let elapsed = window.started_at.elapsed_since(now);
        if window.count >= self.config.max_submissions {
            let retry_after_ms = self.config.window_ms.saturating_sub(elapsed).max(1);
            debug!(identifier, retry_after_ms, "submission rate limited");
            return Err(RateLimited { retry_after_ms });
        }

        window.count += 1;
        Ok(())
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn prune(&self, now: Timestamp) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| w.started_at.elapsed_since(now) < self.config.window_ms);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter() -> SubmissionRateLimiter {
        SubmissionRateLimiter::new(RateLimitConfig {
            window_ms: 60_000,
            max_submissions: 3,
        })
    }

    #[test]
    fn fourth_submission_in_window_is_rate_limited() {
        let limiter = limiter();
        let t0 = Timestamp::from_secs(1_000);
        for i in 0..3 {
            assert!(limiter.check("10.0.0.1", t0.plus_secs(i)).is_ok());
        }
        let err = limiter.check("10.0.0.1", t0.plus_secs(10)).unwrap_err();
        assert_eq!(err.retry_after_ms, 50_000);
        assert!(err.retry_after_secs() > 0);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter();
        let t0 = Timestamp::from_secs(1_000);
        for _ in 0..3 {
            limiter.check("a@b.com", t0).unwrap();
        }
        assert!(limiter.check("a@b.com", t0.plus_millis(59_999)).is_err());
        assert!(limiter.check("a@b.com", t0.plus_millis(60_000)).is_ok());
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = SubmissionRateLimiter::new(RateLimitConfig {
            window_ms: 60_000,
            max_submissions: 1,
        });
        let now = Timestamp::from_secs(5);
        assert!(limiter.check("10.0.0.1", now).is_ok());
        assert!(limiter.check("10.0.0.1", now).is_err());
        assert!(limiter.check("10.0.0.2", now).is_ok());
    }

    #[test]
    fn prune_drops_elapsed_windows() {
        let limiter = limiter();
        let t0 = Timestamp::from_secs(0);
        limiter.check("old", t0).unwrap();
        limiter.check("new", t0.plus_secs(50)).unwrap();
        assert_eq!(limiter.prune(t0.plus_secs(70)), 1);
        assert_eq!(limiter.tracked(), 1);
    }

    proptest! {
        /// Within one window exactly `max` submissions are admitted and every
        /// refusal carries a positive retry delay.
        #[test]
        fn admits_exactly_max_per_window(max in 1u32..20, extra in 1u32..10, offsets in prop::collection::vec(0u64..59_999, 40)) {
            let limiter = SubmissionRateLimiter::new(RateLimitConfig { window_ms: 60_000, max_submissions: max });
            let t0 = Timestamp::from_secs(10_000);
            let mut offsets: Vec<u64> = offsets.into_iter().take((max + extra) as usize).collect();
            offsets.sort_unstable();
            let mut admitted = 0;
            for off in &offsets {
                match limiter.check("id", t0.plus_millis(*off)) {
                    Ok(()) => admitted += 1,
                    Err(e) => prop_assert!(e.retry_after_ms > 0),
                }
            }
            prop_assert_eq!(admitted, (max as usize).min(offsets.len()));
        }
    }
}
