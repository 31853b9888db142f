//! Hand-off of freshly issued tokens to the reviewer.

use thiserror::Error;
use tracing::info;
use vouch_audit::token_prefix;
use vouch_types::{Email, ReviewId};

#[derive(Debug, Error)]
#[error("token delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Sends a verification token to its reviewer, typically by email.
///
/// Called once per issued token. On error the token is revoked and the
/// submission answered with 503.
pub trait TokenDelivery: Send + Sync {
    fn deliver(&self, email: &Email, review_id: &ReviewId, token: &str)
        -> Result<(), DeliveryError>;
}

/// Logs that a token is ready. The secret itself is never logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDelivery;

impl TokenDelivery for LogDelivery {
    fn deliver(
        &self,
        email: &Email,
        review_id: &ReviewId,
        token: &str,
    ) -> Result<(), DeliveryError> {
        info!(
            email_domain = email.domain(),
            review_id = %review_id,
            token = %token_prefix(token),
            "verification token ready for delivery"
        );
        Ok(())
    }
}
