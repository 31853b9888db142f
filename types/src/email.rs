//! Normalized email address.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// An email address, trimmed and lower-cased at construction.
///
/// Two inputs that differ only in case or surrounding whitespace produce the
/// same `Email`, which is what token lookups and rate limiting key on.
/// Deserialization goes through [`Email::parse`] as well.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LEN: usize = 254;
    pub const MAX_LOCAL_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let normalized = raw.trim().to_lowercase();
        let invalid = |why: &str| TypesError::InvalidEmail(format!("{normalized:?}: {why}"));

        if normalized.is_empty() {
            return Err(invalid("empty"));
        }
        if normalized.len() > Self::MAX_LEN {
            return Err(invalid("too long"));
        }
        if normalized.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("contains whitespace"));
        }
        let mut parts = normalized.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => return Err(invalid("must contain exactly one '@'")),
        };
        if local.is_empty() || local.len() > Self::MAX_LOCAL_LEN {
            return Err(invalid("bad local part"));
        }
        if !domain.contains('.') {
            return Err(invalid("domain has no dot"));
        }
        let labels_ok = domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if !labels_ok {
            return Err(invalid("bad domain"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl TryFrom<String> for Email {
    type Error = TypesError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::parse("  Prof@School.EDU \n").unwrap();
        assert_eq!(email.as_str(), "prof@school.edu");
        assert_eq!(email.domain(), "school.edu");
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "",
            "no-at-sign",
            "two@@ats.com",
            "a@b@c.com",
            "@example.com",
            "user@localhost",
            "user@-bad.com",
            "user@exa mple.com",
            "user@example..com",
        ] {
            assert!(Email::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_overlong() {
        let local = "a".repeat(65);
        assert!(Email::parse(&format!("{local}@example.com")).is_err());
        let domain = format!("{}.com", "d".repeat(250));
        assert!(Email::parse(&format!("a@{domain}")).is_err());
    }

    #[test]
    fn deserializing_normalizes_and_validates() {
        let email: Email = serde_json::from_str("\"  Prof@School.EDU \"").unwrap();
        assert_eq!(email.as_str(), "prof@school.edu");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"prof@school.edu\"");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
