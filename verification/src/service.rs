//! Token issue, validation and mutation.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vouch_audit::{token_prefix, AuditEntry, AuditLogger, TokenEvent, TokenEventKind};
use vouch_store::{StoreError, TokenStore};
use vouch_submission::SanitizedSubmission;
use vouch_types::{Clock, Email, ReviewId};

use crate::{
    is_well_formed, TokenConfig, TokenError, TokenErrorKind, TokenGenerator, TokenValidation,
    VerificationToken,
};

/// Compare-and-swap attempts before a mutation gives up.
const MAX_CAS_RETRIES: usize = 64;

/// Fresh secrets tried before issuing gives up on key collisions.
const MAX_GENERATION_ATTEMPTS: usize = 3;

/// A newly issued token. `token` is the secret to deliver to the reviewer.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub record: VerificationToken,
}

/// Result of the verification flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified {
        record: VerificationToken,
        submission: Option<SanitizedSubmission>,
    },
    Rejected(TokenErrorKind),
}

/// Failure inside a compare-and-swap update: either the token refused the
/// transition or the store failed.
enum Refused {
    Token(TokenErrorKind),
    Failed(TokenError),
}

impl From<TokenError> for Refused {
    fn from(e: TokenError) -> Self {
        match e.kind() {
            Some(kind) => Self::Token(kind),
            None => Self::Failed(e),
        }
    }
}

/// Owns the token lifecycle. One instance per process, shared by handlers.
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    generator: TokenGenerator,
    audit: AuditLogger,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        generator: TokenGenerator,
        audit: AuditLogger,
        config: TokenConfig,
    ) -> Self {
        Self {
            store,
            clock,
            generator,
            audit,
            config,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a token with the configured TTL.
    pub fn create_token(
        &self,
        email: &Email,
        review_id: &ReviewId,
        submission: &SanitizedSubmission,
    ) -> Result<IssuedToken, TokenError> {
        self.create_token_with_ttl(email, review_id, submission, self.config.ttl_hours)
    }

    /// Issue a token and persist it with its pending submission as one unit.
    /// On error nothing has been stored.
    pub fn create_token_with_ttl(
        &self,
        email: &Email,
        review_id: &ReviewId,
        submission: &SanitizedSubmission,
        ttl_hours: u64,
    ) -> Result<IssuedToken, TokenError> {
        TokenConfig::check_ttl(ttl_hours)?;
        let payload =
            serde_json::to_vec(submission).map_err(|e| TokenError::Persistence(e.to_string()))?;

        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let token = self.generator.generate()?;
            let now = self.clock.now();
            let record = VerificationToken {
                token: token.clone(),
                email: email.clone(),
                review_id: review_id.clone(),
                created_at: now,
                expires_at: now.plus_hours(ttl_hours),
                used: false,
                attempts: 0,
            };

            match self.store.insert_pending(&token, &record.encode()?, &payload) {
                Ok(()) => {
                    info!(
                        token = %token_prefix(&token),
                        review_id = %review_id,
                        expires_at = %record.expires_at,
                        "verification token issued"
                    );
                    self.record(
                        TokenEvent::new(TokenEventKind::Created, &token, now)
                            .with_subject(email, review_id),
                    );
                    return Ok(IssuedToken { token, record });
                }
                Err(StoreError::Duplicate(_)) => {
                    warn!(token = %token_prefix(&token), "token collision, regenerating");
                }
                Err(e) => {
                    warn!(review_id = %review_id, error = %e, "failed to persist token");
                    return Err(TokenError::Persistence(e.to_string()));
                }
            }
        }
        Err(TokenError::Persistence(
            "could not generate an unused token".into(),
        ))
    }

    /// Check `token` without changing it.
    ///
    /// Malformed input is rejected before storage is touched. Read failures
    /// and undecodable records report `NotFound`.
    pub fn validate_token(&self, token: &str) -> TokenValidation {
        if !is_well_formed(token) {
            debug!(len = token.len(), "malformed token rejected");
            return TokenValidation::not_found();
        }

        let record = match self.load(token) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.record(
                    TokenEvent::new(TokenEventKind::ValidationFailed, token, self.clock.now())
                        .with_detail(TokenErrorKind::NotFound.as_str()),
                );
                return TokenValidation::not_found();
            }
            Err(e) => {
                warn!(token = %token_prefix(token), error = %e, "token read failed, denying");
                return TokenValidation::not_found();
            }
        };

        let now = self.clock.now();
        match record.rejection(now, self.config.max_attempts) {
            None => TokenValidation::valid(record),
            Some(kind) => {
                debug!(token = %token_prefix(token), reason = kind.as_str(), "token rejected");
                self.record(
                    TokenEvent::new(TokenEventKind::ValidationFailed, token, now)
                        .with_subject(&record.email, &record.review_id)
                        .with_attempts(record.attempts)
                        .with_detail(kind.as_str()),
                );
                TokenValidation::invalid(kind, Some(record))
            }
        }
    }

    /// Consume the token. A second call always fails with `AlreadyUsed`.
    pub fn mark_used(&self, token: &str) -> Result<VerificationToken, TokenError> {
        let record = self.update(token, |record| {
            if record.used {
                return Err(TokenError::AlreadyUsed);
            }
            let mut next = record.clone();
            next.used = true;
            Ok(next)
        })?;
        self.record(
            TokenEvent::new(TokenEventKind::Used, token, self.clock.now())
                .with_subject(&record.email, &record.review_id),
        );
        Ok(record)
    }

    /// Count one failed verification attempt. Returns the new count.
    pub fn increment_attempts(&self, token: &str) -> Result<u32, TokenError> {
        let record = self.update(token, |record| {
            let mut next = record.clone();
            next.attempts = next.attempts.saturating_add(1);
            Ok::<_, TokenError>(next)
        })?;
        debug!(token = %token_prefix(token), attempts = record.attempts, "attempt recorded");
        self.record(
            TokenEvent::new(TokenEventKind::AttemptFailed, token, self.clock.now())
                .with_subject(&record.email, &record.review_id)
                .with_attempts(record.attempts),
        );
        Ok(record.attempts)
    }

    /// Invalidate the token for good, recording `reason` in the audit trail.
    pub fn revoke(&self, token: &str, reason: &str) -> Result<VerificationToken, TokenError> {
        let max_attempts = self.config.max_attempts;
        let record = self.update(token, |record| {
            let mut next = record.clone();
            next.used = true;
            next.attempts = next.attempts.max(max_attempts);
            Ok::<_, TokenError>(next)
        })?;
        info!(token = %token_prefix(token), review_id = %record.review_id, reason, "token revoked");
        self.record(
            TokenEvent::new(TokenEventKind::Revoked, token, self.clock.now())
                .with_subject(&record.email, &record.review_id)
                .with_attempts(record.attempts)
                .with_detail(reason),
        );
        Ok(record)
    }

    /// Every token issued to `email`, newest first.
    pub fn find_by_email(&self, email: &Email) -> Result<Vec<VerificationToken>, TokenError> {
        let keys = self
            .store
            .scan_keys()
            .map_err(|e| TokenError::Persistence(e.to_string()))?;
        let mut records = Vec::new();
        for key in keys {
            match self.load(&key) {
                Ok(Some(record)) if &record.email == email => records.push(record),
                Ok(_) => {}
                Err(e) => debug!(token = %token_prefix(&key), error = %e, "skipping unreadable token"),
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// The submission stored with `token`, if it still exists.
    pub fn pending_submission(
        &self,
        token: &str,
    ) -> Result<Option<SanitizedSubmission>, TokenError> {
        if !is_well_formed(token) {
            return Ok(None);
        }
        let bytes = self
            .store
            .get_submission(token)
            .map_err(|e| TokenError::Persistence(e.to_string()))?;
        bytes
            .map(|b| serde_json::from_slice(&b))
            .transpose()
            .map_err(|e| TokenError::Persistence(format!("pending submission: {e}")))
    }

    /// The verification flow behind the public endpoint.
    ///
    /// A supplied `email` that does not match the token's address counts as a
    /// failed attempt and is reported as `NotFound`. Otherwise the token is
    /// consumed, re-checking validity inside the same compare-and-swap so a
    /// concurrent consumer or lockout is never overridden.
    pub fn verify(&self, token: &str, email: Option<&str>) -> Result<VerifyOutcome, TokenError> {
        let validation = self.validate_token(token);
        let record = match (validation.error, validation.record) {
            (None, Some(record)) => record,
            (Some(kind), _) => return Ok(VerifyOutcome::Rejected(kind)),
            (None, None) => return Ok(VerifyOutcome::Rejected(TokenErrorKind::NotFound)),
        };

        if let Some(claimed) = email {
            let matches = Email::parse(claimed).is_ok_and(|claimed| claimed == record.email);
            if !matches {
                if let Err(e) = self.increment_attempts(token) {
                    warn!(token = %token_prefix(token), error = %e, "failed to record attempt");
                }
                return Ok(VerifyOutcome::Rejected(TokenErrorKind::NotFound));
            }
        }

        let max_attempts = self.config.max_attempts;
        let now = self.clock.now();
        let consumed = self.update(token, |current| {
            if let Some(kind) = current.rejection(now, max_attempts) {
                return Err(Refused::Token(kind));
            }
            let mut next = current.clone();
            next.used = true;
            Ok(next)
        });
        let record = match consumed {
            Ok(record) => record,
            Err(Refused::Token(kind)) => return Ok(VerifyOutcome::Rejected(kind)),
            Err(Refused::Failed(e)) => return Err(e),
        };

        let submission = match self.pending_submission(token) {
            Ok(submission) => submission,
            Err(e) => {
                warn!(token = %token_prefix(token), error = %e, "pending submission unreadable");
                None
            }
        };
        info!(token = %token_prefix(token), review_id = %record.review_id, "review verified");
        self.record(
            TokenEvent::new(TokenEventKind::Verified, token, now)
                .with_subject(&record.email, &record.review_id),
        );
        Ok(VerifyOutcome::Verified { record, submission })
    }

    fn load(&self, token: &str) -> Result<Option<VerificationToken>, TokenError> {
        let Some(bytes) = self
            .store
            .get(token)
            .map_err(|e| TokenError::Persistence(e.to_string()))?
        else {
            return Ok(None);
        };
        VerificationToken::decode(&bytes)
            .map(Some)
            .map_err(|e| TokenError::Persistence(format!("corrupt token record: {e}")))
    }

    /// Atomic read-modify-write of one record.
    ///
    /// `apply` sees the current record and returns its replacement; the
    /// write only lands if the stored bytes are unchanged since the read,
    /// otherwise the whole step is retried against the fresh record.
    fn update<E, F>(&self, token: &str, mut apply: F) -> Result<VerificationToken, E>
    where
        E: From<TokenError>,
        F: FnMut(&VerificationToken) -> Result<VerificationToken, E>,
    {
        if !is_well_formed(token) {
            return Err(TokenError::NotFound.into());
        }
        for _ in 0..MAX_CAS_RETRIES {
            let current = match self.store.get(token) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => return Err(TokenError::NotFound.into()),
                Err(e) => return Err(TokenError::Persistence(e.to_string()).into()),
            };
            let record = VerificationToken::decode(&current).map_err(|e| {
                warn!(token = %token_prefix(token), error = %e, "corrupt token record");
                E::from(TokenError::NotFound)
            })?;
            let next = apply(&record)?;
            match self.store.compare_and_swap(token, &current, &next.encode()?) {
                Ok(true) => return Ok(next),
                Ok(false) => debug!(token = %token_prefix(token), "concurrent update, retrying"),
                Err(StoreError::NotFound(_)) => return Err(TokenError::NotFound.into()),
                Err(e) => return Err(TokenError::Persistence(e.to_string()).into()),
            }
        }
        Err(TokenError::Persistence("token update contended too long".into()).into())
    }

    fn record(&self, event: TokenEvent) {
        // Failures are already logged and counted by the logger.
        let _ = self.audit.append(AuditEntry::Token(event));
    }
}
