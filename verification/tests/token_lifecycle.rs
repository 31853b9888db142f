//! End-to-end token lifecycle against the LMDB backend.

use std::sync::Arc;

use vouch_audit::{AuditConfig, AuditLogger};
use vouch_nullables::NullClock;
use vouch_store_lmdb::LmdbEnvironment;
use vouch_submission::{ReviewerProfile, SanitizedSubmission, Testimonial};
use vouch_types::{
    Email, OsRandom, Relationship, ReviewId, ReviewStatus, SubmissionSource, Timestamp,
};
use vouch_verification::{
    TokenConfig, TokenErrorKind, TokenGenerator, TokenService, VerifyOutcome,
};

const NOW_SECS: u64 = 1_760_000_000;

struct Fixture {
    _dir: tempfile::TempDir,
    env: LmdbEnvironment,
    service: TokenService,
    audit: AuditLogger,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 32 * 1024 * 1024).unwrap();
    let (audit, _handle) = AuditLogger::spawn(Arc::new(env.audit_sink()), AuditConfig::default());
    let service = TokenService::new(
        Arc::new(env.token_store()),
        Arc::new(NullClock::new(NOW_SECS)),
        TokenGenerator::new(Arc::new(OsRandom)),
        audit.clone(),
        TokenConfig::default(),
    );
    Fixture {
        _dir: dir,
        env,
        service,
        audit,
    }
}

fn submission(email: &Email) -> SanitizedSubmission {
    SanitizedSubmission {
        reviewer: ReviewerProfile {
            name: "Ada Lovelace".into(),
            email: email.clone(),
            title: Some("Professor".into()),
            organization: None,
            relationship: Relationship::AcademicSupervisor,
            linkedin: None,
        },
        testimonial: Testimonial {
            rating: 4,
            text: "An exceptionally careful student who asked the right questions.".into(),
            skills: vec!["analysis".into()],
            highlights: vec![],
            project: None,
        },
        source: SubmissionSource::Email,
        status: ReviewStatus::Pending,
        submitted_at: Timestamp::from_secs(NOW_SECS),
        trusted_domain: true,
    }
}

#[tokio::test]
async fn create_validate_use_reject() {
    let f = fixture();
    let email = Email::parse("prof@school.edu").unwrap();
    let issued = f
        .service
        .create_token_with_ttl(&email, &ReviewId::new("review-42"), &submission(&email), 24)
        .unwrap();

    let first = f.service.validate_token(&issued.token);
    assert!(first.valid);
    assert_eq!(first.record.unwrap().review_id.as_str(), "review-42");

    f.service.mark_used(&issued.token).unwrap();

    let second = f.service.validate_token(&issued.token);
    assert!(!second.valid);
    assert_eq!(second.error, Some(TokenErrorKind::AlreadyUsed));

    f.audit.flush().await.unwrap();
    let trail = f.env.audit_sink().entries().unwrap();
    assert!(trail.iter().any(|l| l.contains("\"kind\":\"created\"")));
    assert!(trail.iter().any(|l| l.contains("\"kind\":\"used\"")));
    assert!(trail.iter().all(|l| !l.contains(&issued.token)));
}

#[tokio::test]
async fn concurrent_attempts_on_lmdb_are_linearizable() {
    let f = fixture();
    let email = Email::parse("prof@school.edu").unwrap();
    let token = f
        .service
        .create_token(&email, &ReviewId::new("review-7"), &submission(&email))
        .unwrap()
        .token;
    for _ in 0..4 {
        f.service.increment_attempts(&token).unwrap();
    }

    let service = Arc::new(f.service);
    let threads: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            let token = token.clone();
            std::thread::spawn(move || service.increment_attempts(&token).unwrap())
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let validation = service.validate_token(&token);
    assert_eq!(validation.record.map(|r| r.attempts), Some(6));
    assert_eq!(validation.error, Some(TokenErrorKind::TooManyAttempts));
}

#[tokio::test]
async fn racing_verifications_consume_once() {
    let f = fixture();
    let email = Email::parse("prof@school.edu").unwrap();
    let token = f
        .service
        .create_token(&email, &ReviewId::new("review-8"), &submission(&email))
        .unwrap()
        .token;

    let service = Arc::new(f.service);
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let token = token.clone();
            std::thread::spawn(move || service.verify(&token, None).unwrap())
        })
        .collect();
    let outcomes: Vec<VerifyOutcome> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    let verified = outcomes
        .iter()
        .filter(|o| matches!(o, VerifyOutcome::Verified { .. }))
        .count();
    assert_eq!(verified, 1);
    assert!(outcomes.iter().all(|o| matches!(
        o,
        VerifyOutcome::Verified { .. } | VerifyOutcome::Rejected(TokenErrorKind::AlreadyUsed)
    )));
}
