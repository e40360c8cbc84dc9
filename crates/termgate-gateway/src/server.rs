//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use termgate_core::config::TermGateConfig;
use termgate_policy::Policy;

use crate::proxy::{ChatCollaborator, HttpChatProxy};

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    /// The immutable allowlist policy. Shared read-only across requests.
    pub policy: Arc<Policy>,
    pub start_time: std::time::Instant,
    /// Chat proxy collaborator — outside the authorization core.
    pub collaborator: Arc<dyn ChatCollaborator>,
}

impl AppState {
    pub fn new(config: TermGateConfig, policy: Policy) -> Self {
        let collaborator = Arc::new(HttpChatProxy::new(config.proxy));
        Self {
            policy: Arc::new(policy),
            start_time: std::time::Instant::now(),
            collaborator,
        }
    }

    /// Replace the chat collaborator (used by tests to inject a mock).
    pub fn with_collaborator(mut self, collaborator: Arc<dyn ChatCollaborator>) -> Self {
        self.collaborator = collaborator;
        self
    }
}

/// Bearer auth middleware — requires `Authorization: Bearer <token>`.
///
/// Only presence and scheme are checked here; validating the token
/// itself is delegated to the upstream identity collaborator.
async fn require_bearer(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(t) if !t.trim().is_empty() => next.run(req).await,
        _ => axum::response::Response::builder()
            .status(axum::http::StatusCode::UNAUTHORIZED)
            .header("Content-Type", "application/json")
            .body(axum::body::Body::from(
                serde_json::json!({"error": "Unauthorized — missing or malformed bearer token"})
                    .to_string(),
            ))
            .unwrap(),
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    // Protected routes — require a bearer header
    let protected = Router::new()
        .route("/api/v1/terminal", post(crate::routes::terminal))
        .route("/api/v1/ask", post(crate::routes::ask))
        .route_layer(axum::middleware::from_fn(require_bearer));

    // Public routes — no auth
    let public = Router::new().route("/health", get(crate::routes::health_check));

    protected
        .merge(public)
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: TermGateConfig, policy: Policy) -> anyhow::Result<()> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let state = AppState::new(config, policy);
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
