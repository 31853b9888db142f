//! The submission validator.

use tracing::{debug, info};
use vouch_types::{Email, Relationship, ReviewStatus, SubmissionSource, Timestamp};

use crate::heuristics;
use crate::{
    FieldError, ReviewerProfile, SanitizedSubmission, SubmissionConfig, SubmissionInput,
    SubmissionRejection, Testimonial, TrustedDomains,
};

const NAME_CHARS: (usize, usize) = (2, 100);
const SHORT_FIELD_MAX_CHARS: usize = 100;
const SKILL_MAX_CHARS: usize = 50;
const HIGHLIGHT_MAX_CHARS: usize = 200;
const LINKEDIN_MAX_CHARS: usize = 200;
const LINKEDIN_PREFIXES: [&str; 2] = ["https://www.linkedin.com/in/", "https://linkedin.com/in/"];

/// Validates and sanitizes public testimonial submissions.
pub struct SubmissionValidator {
    config: SubmissionConfig,
    trusted: TrustedDomains,
}

impl SubmissionValidator {
    pub fn new(config: SubmissionConfig) -> Self {
        let trusted = TrustedDomains::new(&config.trusted_domain_suffixes);
        Self { config, trusted }
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Validate `input` as received at server time `now`.
    pub fn validate(
        &self,
        input: &SubmissionInput,
        now: Timestamp,
    ) -> Result<SanitizedSubmission, SubmissionRejection> {
        if input.website.as_deref().is_some_and(|v| !v.is_empty()) {
            info!("honeypot field filled, discarding submission");
            return Err(SubmissionRejection::SpamDetected);
        }

        let mut errors = Vec::new();
        let draft = self.check_structure(input, now, &mut errors);
        let submission = match draft {
            Some(submission) if errors.is_empty() => submission,
            _ => {
                debug!(count = errors.len(), "submission failed structural validation");
                return Err(SubmissionRejection::Invalid(errors));
            }
        };

        let texts = std::iter::once(submission.testimonial.text.as_str())
            .chain(submission.testimonial.highlights.iter().map(String::as_str));
        for text in texts {
            if let Some(reason) = heuristics::inspect(text) {
                info!(reason = reason.as_str(), "submission content flagged");
                return Err(SubmissionRejection::ContentSuspicious(reason));
            }
        }

        if submission.reviewer.relationship.requires_trusted_domain() && !submission.trusted_domain
        {
            let domain = submission.reviewer.email.domain().to_string();
            info!(%domain, relationship = submission.reviewer.relationship.as_str(), "untrusted domain for relationship");
            return Err(SubmissionRejection::UntrustedDomain(domain));
        }

        Ok(submission)
    }

    /// Run every structural check, pushing failures into `errors`.
    ///
    /// Returns the sanitized submission when all required parts could be
    /// built; the caller still has to check `errors`.
    fn check_structure(
        &self,
        input: &SubmissionInput,
        now: Timestamp,
        errors: &mut Vec<FieldError>,
    ) -> Option<SanitizedSubmission> {
        let reviewer = &input.reviewer;
        let content = &input.content;

        let rating = match content.rating.as_u64() {
            Some(r @ 1..=5) => Some(r as u8),
            _ => {
                errors.push(FieldError::new(
                    "content.rating",
                    "rating must be an integer between 1 and 5",
                ));
                None
            }
        };

        let text = clean(&content.testimonial, true);
        let text_len = text.chars().count();
        if text_len < self.config.min_testimonial_chars
            || text_len > self.config.max_testimonial_chars
        {
            errors.push(FieldError::new(
                "content.testimonial",
                format!(
                    "testimonial must be between {} and {} characters (got {text_len})",
                    self.config.min_testimonial_chars, self.config.max_testimonial_chars
                ),
            ));
        }

        let name = clean(&reviewer.name, false);
        let name_len = name.chars().count();
        if name_len < NAME_CHARS.0 || name_len > NAME_CHARS.1 {
            errors.push(FieldError::new(
                "reviewer.name",
                format!(
                    "name must be between {} and {} characters",
                    NAME_CHARS.0, NAME_CHARS.1
                ),
            ));
        }

        let email = match Email::parse(&reviewer.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(FieldError::new("reviewer.email", e.to_string()));
                None
            }
        };

        let title = optional_field(&reviewer.title, "reviewer.title", errors);
        let organization = optional_field(&reviewer.organization, "reviewer.organization", errors);
        let project = optional_field(&content.project, "content.project", errors);

        let linkedin = reviewer
            .linkedin
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        if let Some(url) = &linkedin {
            let prefixed = LINKEDIN_PREFIXES.iter().any(|p| url.starts_with(p));
            if !prefixed || url.chars().count() > LINKEDIN_MAX_CHARS {
                errors.push(FieldError::new(
                    "reviewer.linkedin",
                    "linkedin must be a linkedin.com/in/ profile URL",
                ));
            }
        }

        let relationship = match reviewer.relationship.trim().parse::<Relationship>() {
            Ok(r) => Some(r),
            Err(e) => {
                errors.push(FieldError::new("reviewer.relationship", e.to_string()));
                None
            }
        };

        let source = match input
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => Some(SubmissionSource::Website),
            Some(raw) => match raw.parse::<SubmissionSource>() {
                Ok(s) => Some(s),
                Err(e) => {
                    errors.push(FieldError::new("source", e.to_string()));
                    None
                }
            },
        };

        let status = match input
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => Some(ReviewStatus::Pending),
            Some(raw) => match raw.parse::<ReviewStatus>() {
                Ok(ReviewStatus::Pending) => Some(ReviewStatus::Pending),
                Ok(other) => {
                    errors.push(FieldError::new(
                        "status",
                        format!("new submissions must be pending, not {}", other.as_str()),
                    ));
                    None
                }
                Err(e) => {
                    errors.push(FieldError::new("status", e.to_string()));
                    None
                }
            },
        };

        let skills = self.check_skills(&content.skills, errors);
        let highlights = self.check_highlights(&content.highlights, errors);

        let submitted_at = self.check_freshness(input.client_timestamp, now, errors);

        let email = email?;
        let trusted_domain = self.trusted.is_trusted(&email);

        Some(SanitizedSubmission {
            reviewer: ReviewerProfile {
                name,
                email,
                title,
                organization,
                relationship: relationship?,
                linkedin,
            },
            testimonial: Testimonial {
                rating: rating?,
                text,
                skills,
                highlights,
                project,
            },
            source: source?,
            status: status?,
            submitted_at: submitted_at?,
            trusted_domain,
        })
    }

    fn check_skills(&self, raw: &[String], errors: &mut Vec<FieldError>) -> Vec<String> {
        if raw.len() > self.config.max_skills {
            errors.push(FieldError::new(
                "content.skills",
                format!("at most {} skills allowed", self.config.max_skills),
            ));
        }
        let mut skills: Vec<String> = Vec::new();
        for skill in raw {
            let skill = clean(skill, false);
            let len = skill.chars().count();
            if len == 0 || len > SKILL_MAX_CHARS {
                errors.push(FieldError::new(
                    "content.skills",
                    format!("each skill must be 1 to {SKILL_MAX_CHARS} characters"),
                ));
                continue;
            }
            if !skills.iter().any(|s| s.to_lowercase() == skill.to_lowercase()) {
                skills.push(skill);
            }
        }
        skills
    }

    fn check_highlights(&self, raw: &[String], errors: &mut Vec<FieldError>) -> Vec<String> {
        if raw.len() > self.config.max_highlights {
            errors.push(FieldError::new(
                "content.highlights",
                format!("at most {} highlights allowed", self.config.max_highlights),
            ));
        }
        let mut highlights = Vec::with_capacity(raw.len());
        for highlight in raw {
            let highlight = clean(highlight, false);
            let len = highlight.chars().count();
            if len == 0 || len > HIGHLIGHT_MAX_CHARS {
                errors.push(FieldError::new(
                    "content.highlights",
                    format!("each highlight must be 1 to {HIGHLIGHT_MAX_CHARS} characters"),
                ));
                continue;
            }
            highlights.push(highlight);
        }
        highlights
    }

    /// The client timestamp must sit within the freshness window of `now`,
    /// in either direction, to stop replays of captured request bodies.
    fn check_freshness(
        &self,
        client_timestamp: Option<i64>,
        now: Timestamp,
        errors: &mut Vec<FieldError>,
    ) -> Option<Timestamp> {
        let window_ms = self.config.freshness_window_secs.saturating_mul(1_000);
        let submitted_at = match client_timestamp {
            Some(ms) if ms >= 0 => Timestamp::from_millis(ms as u64),
            _ => {
                errors.push(FieldError::new(
                    "clientTimestamp",
                    "client timestamp is required",
                ));
                return None;
            }
        };
        if submitted_at.abs_diff(now) > window_ms {
            errors.push(FieldError::new(
                "clientTimestamp",
                format!(
                    "submission timestamp is outside the {}s freshness window",
                    self.config.freshness_window_secs
                ),
            ));
            return None;
        }
        Some(submitted_at)
    }
}

/// Trim and drop control characters. Newlines survive in multi-line fields.
fn clean(raw: &str, multiline: bool) -> String {
    raw.trim()
        .chars()
        .filter(|&c| !c.is_control() || (multiline && c == '\n'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn optional_field(
    raw: &Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = clean(raw.as_deref()?, false);
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > SHORT_FIELD_MAX_CHARS {
        errors.push(FieldError::new(
            field,
            format!("must be at most {SHORT_FIELD_MAX_CHARS} characters"),
        ));
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentInput, ReviewerInput, SuspicionReason};
    use proptest::prelude::*;

    const NOW_MS: u64 = 1_760_000_000_000;

    fn now() -> Timestamp {
        Timestamp::from_millis(NOW_MS)
    }

    /// Lower-case alphabet cycle: no runs, no words, no links.
    fn text_of_len(n: usize) -> String {
        (0..n).map(|i| (b'a' + (i % 26) as u8) as char).collect()
    }

    fn valid_input() -> SubmissionInput {
        SubmissionInput {
            reviewer: ReviewerInput {
                name: "Dr. Maya Chen".into(),
                email: "Maya.Chen@Example.org".into(),
                title: Some("Staff Engineer".into()),
                organization: Some("Acme Robotics".into()),
                relationship: "colleague".into(),
                linkedin: Some("https://www.linkedin.com/in/mayachen".into()),
            },
            content: ContentInput {
                rating: serde_json::json!(5),
                testimonial: "Working with Sam on the telemetry pipeline was a pleasure. \
                              Clear thinking, careful reviews and calm under pressure."
                    .into(),
                skills: vec!["Rust".into(), "Distributed systems".into(), "rust".into()],
                highlights: vec!["Cut ingest latency in half".into()],
                project: Some("Telemetry v2".into()),
            },
            source: Some("website".into()),
            status: None,
            website: None,
            client_timestamp: Some(NOW_MS as i64 - 2_000),
        }
    }

    fn validator() -> SubmissionValidator {
        SubmissionValidator::new(SubmissionConfig::default())
    }

    fn field_errors(result: Result<SanitizedSubmission, SubmissionRejection>) -> Vec<&'static str> {
        match result {
            Err(SubmissionRejection::Invalid(errors)) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn accepts_and_sanitizes_valid_submission() {
        let sanitized = validator().validate(&valid_input(), now()).unwrap();
        assert_eq!(sanitized.reviewer.email.as_str(), "maya.chen@example.org");
        assert_eq!(sanitized.testimonial.rating, 5);
        assert_eq!(sanitized.testimonial.skills, vec!["Rust", "Distributed systems"]);
        assert_eq!(sanitized.status, ReviewStatus::Pending);
        assert_eq!(sanitized.source, SubmissionSource::Website);
        assert!(!sanitized.trusted_domain);
    }

    #[test]
    fn testimonial_length_boundaries() {
        let v = validator();
        for (len, ok) in [(49, false), (50, true), (2000, true), (2001, false)] {
            let mut input = valid_input();
            input.content.testimonial = format!("  {}  ", text_of_len(len));
            assert_eq!(v.validate(&input, now()).is_ok(), ok, "length {len}");
        }
    }

    #[test]
    fn rating_must_be_integer_in_range() {
        let v = validator();
        for rating in [
            serde_json::json!(0),
            serde_json::json!(6),
            serde_json::json!(4.5),
            serde_json::json!("5"),
            serde_json::Value::Null,
        ] {
            let mut input = valid_input();
            input.content.rating = rating.clone();
            assert_eq!(field_errors(v.validate(&input, now())), vec!["content.rating"], "{rating}");
        }
        let mut input = valid_input();
        input.content.rating = serde_json::json!(1);
        assert!(v.validate(&input, now()).is_ok());
    }

    #[test]
    fn collects_every_structural_error() {
        let mut input = valid_input();
        input.reviewer.relationship = "boss".into();
        input.source = Some("tiktok".into());
        input.content.skills = (0..11).map(|i| format!("skill {i}")).collect();
        input.content.highlights = (0..6).map(|i| format!("highlight {i}")).collect();
        let fields = field_errors(validator().validate(&input, now()));
        assert!(fields.contains(&"reviewer.relationship"));
        assert!(fields.contains(&"source"));
        assert!(fields.contains(&"content.skills"));
        assert!(fields.contains(&"content.highlights"));
    }

    #[test]
    fn public_submission_cannot_self_approve() {
        let mut input = valid_input();
        input.status = Some("approved".into());
        assert_eq!(field_errors(validator().validate(&input, now())), vec!["status"]);
        input.status = Some("pending".into());
        assert!(validator().validate(&input, now()).is_ok());
    }

    #[test]
    fn stale_or_future_timestamps_rejected() {
        let v = validator();
        let window = 300_000i64;
        for (offset, ok) in [
            (-window, true),
            (window, true),
            (-window - 1, false),
            (window + 1, false),
        ] {
            let mut input = valid_input();
            input.client_timestamp = Some(NOW_MS as i64 + offset);
            assert_eq!(v.validate(&input, now()).is_ok(), ok, "offset {offset}");
        }
        let mut input = valid_input();
        input.client_timestamp = None;
        assert_eq!(field_errors(v.validate(&input, now())), vec!["clientTimestamp"]);
    }

    #[test]
    fn honeypot_wins_over_everything() {
        let mut input = valid_input();
        input.website = Some("http://bot.example".into());
        assert_eq!(
            validator().validate(&input, now()),
            Err(SubmissionRejection::SpamDetected)
        );

        // Even a payload that would otherwise be invalid reports only spam.
        let mut broken = SubmissionInput::default();
        broken.website = Some("x".into());
        assert_eq!(
            validator().validate(&broken, now()),
            Err(SubmissionRejection::SpamDetected)
        );
    }

    #[test]
    fn whitespace_honeypot_is_spam() {
        for filler in ["   ", " \t ", "\n"] {
            let mut input = valid_input();
            input.website = Some(filler.into());
            assert_eq!(
                validator().validate(&input, now()),
                Err(SubmissionRejection::SpamDetected),
                "{filler:?}"
            );
        }
    }

    #[test]
    fn empty_honeypot_is_ignored() {
        let mut input = valid_input();
        input.website = Some(String::new());
        assert!(validator().validate(&input, now()).is_ok());
    }

    #[test]
    fn heuristics_run_on_testimonial_and_highlights() {
        let mut input = valid_input();
        input.content.testimonial.push_str(" Visit my page for a discount.");
        assert_eq!(
            validator().validate(&input, now()),
            Err(SubmissionRejection::ContentSuspicious(
                SuspicionReason::CommercialLanguage
            ))
        );

        let mut input = valid_input();
        input.content.highlights = vec!["see cheap.shop".into()];
        assert_eq!(
            validator().validate(&input, now()),
            Err(SubmissionRejection::ContentSuspicious(SuspicionReason::EmbeddedUrl))
        );
    }

    #[test]
    fn heuristics_skipped_when_structure_fails() {
        let mut input = valid_input();
        input.content.testimonial = "buy buy buy".into();
        assert!(matches!(
            validator().validate(&input, now()),
            Err(SubmissionRejection::Invalid(_))
        ));
    }

    #[test]
    fn academic_relationship_requires_trusted_domain() {
        let mut input = valid_input();
        input.reviewer.relationship = "academic_supervisor".into();
        assert_eq!(
            validator().validate(&input, now()),
            Err(SubmissionRejection::UntrustedDomain("example.org".into()))
        );

        input.reviewer.email = "prof@cs.school.edu".into();
        let sanitized = validator().validate(&input, now()).unwrap();
        assert!(sanitized.trusted_domain);
        assert_eq!(sanitized.reviewer.relationship, Relationship::AcademicSupervisor);
    }

    #[test]
    fn bad_linkedin_and_email_reported() {
        let mut input = valid_input();
        input.reviewer.linkedin = Some("https://evil.example/in/me".into());
        input.reviewer.email = "not-an-email".into();
        let fields = field_errors(validator().validate(&input, now()));
        assert_eq!(fields, vec!["reviewer.email", "reviewer.linkedin"]);
    }

    #[test]
    fn control_characters_stripped() {
        let mut input = valid_input();
        input.reviewer.name = "Maya\u{0007} Chen".into();
        input.content.testimonial = format!("{}\n\u{0000}second line", text_of_len(60));
        let sanitized = validator().validate(&input, now()).unwrap();
        assert_eq!(sanitized.reviewer.name, "Maya Chen");
        assert!(sanitized.testimonial.text.contains('\n'));
        assert!(!sanitized.testimonial.text.contains('\u{0000}'));
    }

    proptest! {
        /// Acceptance depends on trimmed character length alone.
        #[test]
        fn length_window_is_exact(len in 0usize..2100, pad in 0usize..5) {
            let mut input = valid_input();
            let padding = " ".repeat(pad);
            input.content.testimonial = format!("{padding}{}{padding}", text_of_len(len));
            let ok = validator().validate(&input, now()).is_ok();
            prop_assert_eq!(ok, (50..=2000).contains(&len));
        }

        /// A filled honeypot is always rejected as spam.
        #[test]
        fn any_honeypot_value_is_spam(value in "[ -~\t\n]{1,20}") {
            let mut input = valid_input();
            input.website = Some(value);
            prop_assert_eq!(validator().validate(&input, now()), Err(SubmissionRejection::SpamDetected));
        }
    }
}
