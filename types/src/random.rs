//! Source of secret random bytes.

use crate::TypesError;

/// Fills buffers with unpredictable bytes.
///
/// Token secrets are drawn from this source. Production code uses
/// [`OsRandom`]; tests use a deterministic implementation.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TypesError>;
}

/// The operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TypesError> {
        getrandom::getrandom(buf).map_err(|e| TypesError::Random(e.to_string()))
    }
}
