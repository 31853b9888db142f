use serde::{Deserialize, Serialize};

use crate::TokenError;

/// Token lifecycle settings, the `[tokens]` section of the daemon config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Hours from issue until a token expires.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Failed verification attempts after which a token stops validating.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_max_attempts() -> u32 {
    5
}

impl TokenConfig {
    /// Longest lifetime a token may be issued with: one year.
    pub const MAX_TTL_HOURS: u64 = 24 * 365;

    /// Reject a TTL outside `1..=MAX_TTL_HOURS`.
    pub fn check_ttl(ttl_hours: u64) -> Result<(), TokenError> {
        if ttl_hours == 0 {
            return Err(TokenError::Validation("ttl must be at least one hour".into()));
        }
        if ttl_hours > Self::MAX_TTL_HOURS {
            return Err(TokenError::Validation(format!(
                "ttl of {ttl_hours}h exceeds the {}h maximum",
                Self::MAX_TTL_HOURS
            )));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        Self::check_ttl(self.ttl_hours)?;
        if self.max_attempts == 0 {
            return Err(TokenError::Validation(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(TokenConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_attempts_and_bad_ttl() {
        let zero_attempts = TokenConfig {
            max_attempts: 0,
            ..TokenConfig::default()
        };
        assert!(matches!(zero_attempts.validate(), Err(TokenError::Validation(_))));

        for ttl_hours in [0, TokenConfig::MAX_TTL_HOURS + 1, u64::MAX] {
            let config = TokenConfig {
                ttl_hours,
                ..TokenConfig::default()
            };
            assert!(config.validate().is_err(), "accepted ttl {ttl_hours}");
        }
        assert!(TokenConfig::check_ttl(TokenConfig::MAX_TTL_HOURS).is_ok());
    }
}
