//! HTTP/WebSocket API for the game server.
//!
//! # Endpoints
//!
//! ```text
//! GET /                         - WebSocket game connection
//! GET /ws                       - Same, for proxies that route by path
//! GET /health                   - Server health status
//! GET /api/v1/sessions/{code}   - Read-only snapshot of a live session
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use c4_server::api::{create_router, AppState};
//! use c4_server::config::ServerConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(ServerConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively so browser clients served from another
//! origin can reach the lookup endpoint.

pub mod rate_limiter;
pub mod sessions;
pub mod websocket;

use crate::config::ServerConfig;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use connect_four::SessionRegistry;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state with a fresh, empty registry.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config.session.clone())),
            config: Arc::new(config),
        }
    }
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new().route("/sessions/{code}", get(sessions::get_session));

    Router::new()
        .route("/", get(websocket::websocket_handler))
        .route("/ws", get(websocket::websocket_handler))
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8001/health
/// # {"status":"healthy","version":"0.1.0","sessions":3,"timestamp":"2026-01-01T10:30:00+00:00"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.registry.live_sessions(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
