//! Timestamp type and the clock abstraction used throughout the service.
//!
//! Timestamps are Unix epoch milliseconds (UTC). On the wire and in persisted
//! records they are rendered as RFC 3339 / ISO-8601 strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TypesError;

const MILLIS_PER_SEC: u64 = 1_000;
const MILLIS_PER_HOUR: u64 = 3_600_000;

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MILLIS_PER_SEC))
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / MILLIS_PER_SEC
    }

    /// Milliseconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Absolute distance between two timestamps in milliseconds.
    pub fn abs_diff(&self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }

    pub fn plus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        self.plus_millis(secs.saturating_mul(MILLIS_PER_SEC))
    }

    pub fn plus_hours(&self, hours: u64) -> Self {
        self.plus_millis(hours.saturating_mul(MILLIS_PER_HOUR))
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_millis: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_millis)
    }

    /// Render as an RFC 3339 string with millisecond precision, e.g.
    /// `2026-10-19T08:30:00.000Z`. Fails for instants past the calendar
    /// range, which could not be parsed back.
    pub fn to_rfc3339(&self) -> Result<String, TypesError> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .ok_or_else(|| TypesError::InvalidTimestamp(format!("{}ms: out of range", self.0)))
    }

    /// Parse an RFC 3339 string. Instants before the epoch are rejected.
    pub fn parse_rfc3339(s: &str) -> Result<Self, TypesError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| TypesError::InvalidTimestamp(format!("{s}: {e}")))?;
        let millis = dt.timestamp_millis();
        if millis < 0 {
            return Err(TypesError::InvalidTimestamp(format!(
                "{s}: before unix epoch"
            )));
        }
        Ok(Self(millis as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&rendered)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}

/// Source of the current time.
///
/// Production code uses [`SystemClock`]; tests swap in a controllable clock
/// so expiry and freshness windows can be exercised deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
