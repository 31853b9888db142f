//! Allow-list of institutional email domains.

use vouch_types::Email;

/// Domain suffixes that grant elevated trust, e.g. `.edu` or `.ac.uk`.
#[derive(Clone, Debug)]
pub struct TrustedDomains {
    suffixes: Vec<String>,
}

impl TrustedDomains {
    /// Suffixes are lower-cased and given a leading dot, so `edu` and `.EDU`
    /// are equivalent and `notedu.com` never matches `edu`.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != ".")
            .map(|s| if s.starts_with('.') { s } else { format!(".{s}") })
            .collect();
        Self { suffixes }
    }

    pub fn is_trusted(&self, email: &Email) -> bool {
        let domain = email.domain();
        self.suffixes
            .iter()
            .any(|suffix| domain.ends_with(suffix.as_str()) || domain == &suffix[1..])
    }
}
