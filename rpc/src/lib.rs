//! HTTP API for the Vouch service.
//!
//! Routes:
//! - `POST /api/reviews`: submit a testimonial for email verification
//! - `POST /api/reviews/verify`: consume a verification token
//! - `POST /api/admin/actions`: record a moderation action
//! - `POST /api/admin/tokens/revoke`, `GET /api/admin/tokens`: token support
//! - `GET /health`, `GET /metrics`

pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::RpcConfig;
pub use delivery::{DeliveryError, LogDelivery, TokenDelivery};
pub use error::ApiError;
pub use metrics::VouchMetrics;
pub use server::{router, RpcServer, ServerError};
pub use state::AppState;
