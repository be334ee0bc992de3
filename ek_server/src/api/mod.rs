//! HTTP API for the envkeep server.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login, logout and the current-user endpoint
//! - [`config`]: Environment-scoped configuration CRUD and search
//! - [`middleware`]: Bearer-token middleware for protected endpoints
//! - [`request_id`]: Request correlation ids
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                          - Health check (public)
//! POST   /api/v1/auth/register            - Register user (public)
//! POST   /api/v1/auth/login               - Login, returns bearer token (public)
//! POST   /api/v1/auth/logout              - Revoke presented token (auth required)
//! GET    /api/v1/auth/me                  - Current user (auth required)
//! GET    /api/v1/config?environment=      - List entries (auth required)
//! GET    /api/v1/config/search?pattern=   - Search keys (auth required)
//! GET    /api/v1/config/{key}             - Read entry (auth required)
//! PUT    /api/v1/config/{key}             - Set entry (auth required)
//! DELETE /api/v1/config/{key}             - Delete entry (auth required)
//! ```

pub mod auth;
pub mod config;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use envkeep::{AuthManager, ConfigManager, db::timeouts::with_default_timeout};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub config_manager: Arc<ConfigManager>,
    pub pool: Arc<SqlitePool>,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Rejection returned by handlers
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router(state.clone()))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/config", get(config::list_config))
        .route("/config/search", get(config::search_config))
        .route(
            "/config/{key}",
            get(config::get_config)
                .put(config::set_config)
                .delete(config::delete_config),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers within the default query
/// timeout, `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = with_default_timeout(sqlx::query("SELECT 1").execute(state.pool.as_ref()))
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
