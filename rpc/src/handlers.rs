//! Route handlers and the admin gate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use vouch_audit::{token_prefix, AdminAction, AdminActionLog};
use vouch_submission::{SubmissionInput, SubmissionRejection};
use vouch_types::{Email, ReviewId, Timestamp};
use vouch_verification::{VerificationToken, VerifyOutcome};

use crate::{ApiError, AppState};

/// Body of every accepted submission, and of every silently dropped one.
pub fn pending_verification() -> Value {
    json!({
        "status": "pending_verification",
        "message": "Thank you. Please check your email to verify your review.",
    })
}

// ── Public ───────────────────────────────────────────────────────────────

/// `POST /api/reviews`
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let started = Instant::now();
    let client = state.client_address(peer, &headers);
    let outcome = accept_submission(&state, &client, payload);
    state
        .metrics
        .submission_time_ms
        .observe(started.elapsed().as_secs_f64() * 1_000.0);

    let label = match &outcome {
        Ok(()) => "accepted",
        Err(ApiError::Rejected(SubmissionRejection::SpamDetected)) => "spam",
        Err(ApiError::Rejected(_)) | Err(ApiError::InvalidRequest(_)) => "rejected",
        Err(ApiError::RateLimited(_)) => "rate_limited",
        Err(_) => "failed",
    };
    state.metrics.submissions.with_label_values(&[label]).inc();

    outcome?;
    Ok((StatusCode::ACCEPTED, Json(pending_verification())))
}

fn accept_submission(
    state: &AppState,
    client: &str,
    payload: Result<Json<SubmissionInput>, JsonRejection>,
) -> Result<(), ApiError> {
    let now = state.clock.now();
    state.ip_limiter.check(client, now).inspect_err(|e| {
        info!(client, retry_after_ms = e.retry_after_ms, "submission rate limited by address");
    })?;

    let Json(input) = payload?;
    let submission = match state.validator.validate(&input, now) {
        Ok(submission) => submission,
        Err(SubmissionRejection::SpamDetected) => {
            info!(client, "honeypot tripped, submission dropped");
            return Err(SubmissionRejection::SpamDetected.into());
        }
        Err(rejection) => {
            debug!(client, kind = rejection.kind(), "submission rejected");
            return Err(rejection.into());
        }
    };

    let email = submission.reviewer.email.clone();
    state.email_limiter.check(email.as_str(), now).inspect_err(|e| {
        info!(
            email_domain = email.domain(),
            retry_after_ms = e.retry_after_ms,
            "submission rate limited by email"
        );
    })?;

    let review_id = ReviewId::generate();
    let issued = state.tokens.create_token(&email, &review_id, &submission)?;

    if let Err(e) = state.delivery.deliver(&email, &review_id, &issued.token) {
        warn!(review_id = %review_id, error = %e, "token delivery failed, revoking");
        if let Err(e) = state.tokens.revoke(&issued.token, "delivery failed") {
            warn!(token = %token_prefix(&issued.token), error = %e, "revoke after failed delivery");
        }
        return Err(ApiError::Unavailable("verification email could not be sent".into()));
    }

    info!(review_id = %review_id, email_domain = email.domain(), "review awaiting verification");
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/reviews/verify`
pub async fn verify_review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .tokens
        .verify(request.token.trim(), request.email.as_deref())?;
    match outcome {
        VerifyOutcome::Verified { record, .. } => {
            state.metrics.verifications.with_label_values(&["verified"]).inc();
            Ok(Json(json!({ "verified": true, "reviewId": record.review_id })))
        }
        VerifyOutcome::Rejected(kind) => {
            state
                .metrics
                .verifications
                .with_label_values(&[kind.as_str()])
                .inc();
            Err(ApiError::Verification(kind))
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let m = &state.metrics;
    m.audit_written.set(clamp(state.audit.written()));
    m.audit_failures.set(clamp(state.audit.failures()));
    let body = m.render().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ── Admin ────────────────────────────────────────────────────────────────

/// The operator named by `X-Admin-User`, set by [`require_admin`].
#[derive(Clone, Debug)]
pub struct AdminUser(pub String);

/// Gate for the admin routes: a matching bearer key and a named operator.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state
        .config
        .admin_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
    else {
        warn!("admin request refused, no admin key configured");
        return Err(ApiError::Unauthorized);
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if !presented.is_some_and(|key| keys_match(key, expected)) {
        warn!(path = %request.uri().path(), "admin request with bad credentials");
        return Err(ApiError::Unauthorized);
    }

    let user = request
        .headers()
        .get("x-admin-user")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidRequest("X-Admin-User header is required".into()))?;
    request.extensions_mut().insert(AdminUser(user));
    Ok(next.run(request).await)
}

/// Constant-time key comparison that does not leak the expected length.
fn keys_match(presented: &str, expected: &str) -> bool {
    let len = presented.len().max(expected.len());
    let mut a = vec![0u8; len];
    let mut b = vec![0xFFu8; len];
    a[..presented.len()].copy_from_slice(presented.as_bytes());
    b[..expected.len()].copy_from_slice(expected.as_bytes());
    (presented.len().ct_eq(&expected.len()) & a.ct_eq(&b)).into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionRequest {
    pub action: AdminAction,
    pub review_id: ReviewId,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /api/admin/actions`
pub async fn record_admin_action(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(user)): Extension<AdminUser>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<AdminActionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    if request.review_id.as_str().trim().is_empty() {
        return Err(ApiError::InvalidRequest("reviewId is required".into()));
    }

    let log = AdminActionLog {
        action: request.action,
        review_id: request.review_id,
        performed_by: user,
        performed_at: state.clock.now(),
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        source_address: Some(state.client_address(peer, &headers)),
    };
    // A dropped entry fails the request.
    state
        .audit
        .record_admin_action(log)
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    state.metrics.admin_actions.inc();
    Ok(Json(json!({ "logged": true })))
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
    pub reason: String,
}

/// `POST /api/admin/tokens/revoke`
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(user)): Extension<AdminUser>,
    payload: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let reason = request.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::InvalidRequest("reason is required".into()));
    }
    let record = state
        .tokens
        .revoke(request.token.trim(), &format!("{reason} (by {user})"))?;
    state.metrics.tokens_revoked.inc();
    Ok(Json(json!({ "revoked": true, "reviewId": record.review_id })))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub email: String,
}

/// A token record with the secret cut down to its prefix.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub token_prefix: String,
    pub email: Email,
    pub review_id: ReviewId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub used: bool,
    pub attempts: u32,
    pub state: &'static str,
}

impl TokenSummary {
    fn from_record(record: VerificationToken, now: Timestamp, max_attempts: u32) -> Self {
        Self {
            token_prefix: token_prefix(&record.token),
            state: record.state(now, max_attempts).as_str(),
            email: record.email,
            review_id: record.review_id,
            created_at: record.created_at,
            expires_at: record.expires_at,
            used: record.used,
            attempts: record.attempts,
        }
    }
}

/// `GET /api/admin/tokens?email=`
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let email =
        Email::parse(&query.email).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let now = state.clock.now();
    let max_attempts = state.tokens.config().max_attempts;
    let tokens: Vec<TokenSummary> = state
        .tokens
        .find_by_email(&email)?
        .into_iter()
        .map(|record| TokenSummary::from_record(record, now, max_attempts))
        .collect();
    Ok(Json(json!({ "email": email, "tokens": tokens })))
}
