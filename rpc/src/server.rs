//! Axum router and HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the full route table over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/actions", post(handlers::record_admin_action))
        .route("/tokens", get(handlers::list_tokens))
        .route("/tokens/revoke", post(handlers::revoke_token))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            handlers::require_admin,
        ));

    Router::new()
        .route("/api/reviews", post(handlers::submit_review))
        .route("/api/reviews/verify", post(handlers::verify_review))
        .nest("/api/admin", admin)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-admin-user"),
        ])
}

/// The HTTP listener.
pub struct RpcServer {
    state: Arc<AppState>,
}

impl RpcServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn start(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = self.state.config.bind_address.clone();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!(addr = %addr, "HTTP API listening");

        let app = router(self.state);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            info!("HTTP API shutting down");
        })
        .await?;
        Ok(())
    }
}
