//! Nullable clock: deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};

use vouch_types::{Clock, Timestamp};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Safe to share between threads so
/// it can be handed to services behind an `Arc<dyn Clock>`.
pub struct NullClock {
    current_millis: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current_millis: AtomicU64::new(initial_secs * 1_000),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.advance_millis(secs * 1_000);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.current_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current_millis.store(secs * 1_000, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.current_millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_when_told() {
        let clock = NullClock::new(100);
        assert_eq!(clock.now().as_secs(), 100);
        clock.advance(5);
        clock.advance_millis(250);
        assert_eq!(clock.now().as_millis(), 105_250);
        clock.set(7);
        assert_eq!(clock.now().as_secs(), 7);
    }
}
