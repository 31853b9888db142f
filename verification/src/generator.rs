//! Token secret generation.

use std::sync::Arc;

use zeroize::Zeroizing;

use vouch_types::RandomSource;

use crate::TokenError;

/// Bytes of entropy per token.
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Whether `token` has the shape of an issued token: exactly
/// [`TOKEN_HEX_LEN`] lower-case hex digits.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Draws token secrets from a [`RandomSource`].
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn RandomSource>,
}

impl TokenGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    pub fn generate(&self) -> Result<String, TokenError> {
        let mut bytes = Zeroizing::new([0u8; TOKEN_BYTES]);
        self.source
            .fill(&mut bytes[..])
            .map_err(|e| TokenError::Persistence(format!("random source: {e}")))?;
        Ok(hex::encode(&bytes[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_nullables::NullRandom;
    use vouch_types::OsRandom;

    #[test]
    fn generates_well_formed_distinct_tokens() {
        let generator = TokenGenerator::new(Arc::new(OsRandom));
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert!(is_well_formed(&a));
        assert!(is_well_formed(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn failing_source_is_an_error() {
        let generator = TokenGenerator::new(Arc::new(NullRandom::failing()));
        assert!(matches!(
            generator.generate(),
            Err(TokenError::Persistence(_))
        ));
    }

    #[test]
    fn shape_check() {
        assert!(is_well_formed(&"0f".repeat(32)));
        assert!(!is_well_formed(&"0F".repeat(32)));
        assert!(!is_well_formed(&"0f".repeat(31)));
        assert!(!is_well_formed(&format!("{}g", "0".repeat(63))));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("../../etc/passwd"));
    }
}
