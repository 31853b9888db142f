use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use vouch_audit::AuditLogger;
use vouch_submission::{SubmissionRateLimiter, SubmissionValidator};
use vouch_types::Clock;
use vouch_verification::TokenService;

use crate::{RpcConfig, TokenDelivery, VouchMetrics};

/// Everything a handler needs, shared as `State<Arc<AppState>>`.
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub validator: SubmissionValidator,
    /// Submission limit keyed by client address.
    pub ip_limiter: SubmissionRateLimiter,
    /// Submission limit keyed by normalized reviewer email.
    pub email_limiter: SubmissionRateLimiter,
    pub audit: AuditLogger,
    pub delivery: Arc<dyn TokenDelivery>,
    pub metrics: VouchMetrics,
    pub clock: Arc<dyn Clock>,
    pub config: RpcConfig,
}

impl AppState {
    /// The address a request is attributed to.
    pub fn client_address(&self, peer: SocketAddr, headers: &HeaderMap) -> String {
        if self.config.trust_forwarded_for {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(addr) = forwarded {
                return addr.to_string();
            }
        }
        peer.ip().to_string()
    }
}
