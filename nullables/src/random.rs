//! Nullable random: deterministic byte generation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use vouch_types::{RandomSource, TypesError};

/// A deterministic random source for testing.
///
/// Every call produces a different, reproducible buffer: byte `i` of call
/// `n` is `(n * 31 + i) mod 256`, with the call number also written into the
/// first eight bytes so buffers never repeat.
pub struct NullRandom {
    calls: AtomicU64,
    failing: AtomicBool,
}

impl NullRandom {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// A source whose every call fails, as if the OS entropy pool were
    /// unavailable.
    pub fn failing() -> Self {
        let source = Self::new();
        source.failing.store(true, Ordering::SeqCst);
        source
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for NullRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for NullRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TypesError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TypesError::Random("null random configured to fail".into()));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (n.wrapping_mul(31).wrapping_add(i as u64) & 0xFF) as u8;
        }
        for (byte, counter) in buf.iter_mut().zip(n.to_be_bytes()) {
            *byte ^= counter;
        }
        Ok(())
    }
}
