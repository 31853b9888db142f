use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sweep settings, the `[cleanup]` section of the daemon config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How long an expired record is kept past its `expiresAt`.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    /// Age since `createdAt` after which a record that can no longer
    /// validate is removed, whatever its expiry.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_interval_secs() -> u64 {
    3_600
}

fn default_grace_secs() -> u64 {
    3_600
}

fn default_max_age_secs() -> u64 {
    7 * 24 * 3_600
}

impl CleanupConfig {
    /// Upper bound for `grace_secs` and `max_age_secs`: ten years.
    pub const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 3_600;

    /// Reject retention values past [`Self::MAX_RETENTION_SECS`].
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("grace_secs", self.grace_secs),
            ("max_age_secs", self.max_age_secs),
        ] {
            if value > Self::MAX_RETENTION_SECS {
                return Err(format!(
                    "{name} = {value} exceeds the {} second maximum",
                    Self::MAX_RETENTION_SECS
                ));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            grace_secs: default_grace_secs(),
            max_age_secs: default_max_age_secs(),
        }
    }
}
