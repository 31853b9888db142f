//! API errors and their HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use vouch_submission::{RateLimited, SubmissionRejection};
use vouch_verification::{TokenError, TokenErrorKind};

use crate::handlers::pending_verification;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Rejected(SubmissionRejection),

    #[error("{0}")]
    RateLimited(RateLimited),

    /// A token that did not verify. Rendered in the verification body shape.
    #[error("verification failed: {0}")]
    Verification(TokenErrorKind),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(SubmissionRejection::SpamDetected) => StatusCode::ACCEPTED,
            Self::Rejected(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Verification(kind) => match kind {
                TokenErrorKind::NotFound => StatusCode::NOT_FOUND,
                TokenErrorKind::AlreadyUsed => StatusCode::CONFLICT,
                TokenErrorKind::Expired => StatusCode::GONE,
                TokenErrorKind::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Rejected(rejection) => {
                let details = match rejection {
                    SubmissionRejection::Invalid(errors) => json!(errors),
                    SubmissionRejection::ContentSuspicious(reason) => {
                        json!([{ "reason": reason.as_str() }])
                    }
                    SubmissionRejection::UntrustedDomain(domain) => {
                        json!([{ "field": "reviewer.email", "domain": domain }])
                    }
                    SubmissionRejection::SpamDetected => return pending_verification(),
                };
                json!({ "error": rejection.kind(), "details": details })
            }
            Self::RateLimited(limit) => json!({
                "error": "RateLimited",
                "retryAfter": limit.retry_after_secs(),
            }),
            Self::Verification(kind) => json!({ "verified": false, "error": kind.as_str() }),
            Self::NotFound(msg) => json!({ "error": "NotFound", "details": [msg] }),
            Self::Conflict(msg) => json!({ "error": "Conflict", "details": [msg] }),
            Self::InvalidRequest(msg) => json!({ "error": "InvalidRequest", "details": [msg] }),
            Self::Unauthorized => json!({ "error": "Unauthorized", "details": [] }),
            Self::Unavailable(msg) => json!({ "error": "Unavailable", "details": [msg] }),
            // Storage detail stays in the logs.
            Self::Internal(_) => json!({ "error": "InternalError", "details": [] }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(msg) = &self {
            tracing::error!(error = %msg, "request failed");
        }
        let mut response = (self.status(), Json(self.body())).into_response();
        if let Self::RateLimited(limit) = &self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(limit.retry_after_secs()),
            );
        }
        response
    }
}

impl From<SubmissionRejection> for ApiError {
    fn from(e: SubmissionRejection) -> Self {
        Self::Rejected(e)
    }
}

impl From<RateLimited> for ApiError {
    fn from(e: RateLimited) -> Self {
        Self::RateLimited(e)
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::NotFound => Self::NotFound("token".into()),
            TokenError::AlreadyUsed => Self::Conflict("token has already been used".into()),
            TokenError::Validation(msg) => Self::InvalidRequest(msg),
            TokenError::Persistence(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::InvalidRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_submission::{FieldError, SuspicionReason};

    #[test]
    fn verification_errors_map_to_distinct_statuses() {
        let cases = [
            (TokenErrorKind::NotFound, 404),
            (TokenErrorKind::AlreadyUsed, 409),
            (TokenErrorKind::Expired, 410),
            (TokenErrorKind::TooManyAttempts, 429),
        ];
        for (kind, status) in cases {
            let err = ApiError::Verification(kind);
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.body()["error"], kind.as_str());
            assert_eq!(err.body()["verified"], false);
        }
    }

    #[test]
    fn rejection_bodies_carry_kind_and_details() {
        let invalid = ApiError::from(SubmissionRejection::Invalid(vec![FieldError::new(
            "content.rating",
            "must be between 1 and 5",
        )]));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body()["error"], "ValidationError");
        assert_eq!(invalid.body()["details"][0]["field"], "content.rating");

        let suspicious = ApiError::from(SubmissionRejection::ContentSuspicious(
            SuspicionReason::EmbeddedUrl,
        ));
        assert_eq!(suspicious.body()["details"][0]["reason"], "embedded_url");
    }

    #[test]
    fn spam_renders_as_accepted() {
        let spam = ApiError::from(SubmissionRejection::SpamDetected);
        assert_eq!(spam.status(), StatusCode::ACCEPTED);
        assert_eq!(spam.body(), pending_verification());
    }

    #[test]
    fn rate_limit_sets_retry_after() {
        let response = ApiError::from(RateLimited {
            retry_after_ms: 1_500,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn persistence_detail_is_not_exposed() {
        let err = ApiError::from(TokenError::Persistence("lmdb: MDB_MAP_FULL".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body().to_string().contains("MDB_MAP_FULL"));
    }
}
