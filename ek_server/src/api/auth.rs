//! Authentication API handlers.
//!
//! Register:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "hunter2pass"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "hunter2pass"}'
//! ```

use axum::{Extension, Json, extract::State, http::StatusCode};
use envkeep::{AuthError, User};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, api_error, middleware::BearerToken};
use crate::{logging::log_security_event, metrics};

/// One message for every credential failure
const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

/// Register a new user account.
///
/// # Errors
///
/// - `400 Bad Request`: Empty username or password
/// - `409 Conflict`: Username already taken
/// - `500 Internal Server Error`: Store failure
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        ));
    }

    match state
        .auth_manager
        .create_user(&payload.username, &payload.password)
        .await
    {
        Ok(user_id) => {
            metrics::registration();
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    user_id,
                    username: payload.username,
                }),
            ))
        }
        Err(e @ AuthError::DuplicateUsername) => {
            Err(api_error(StatusCode::CONFLICT, e.client_message()))
        }
        Err(e) => {
            tracing::error!("Registration failed: {e}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.client_message(),
            ))
        }
    }
}

/// Verify credentials and issue a bearer token.
///
/// Unknown usernames and wrong passwords produce the same `401` body.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let internal = |e: AuthError| {
        tracing::error!("Login failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.client_message())
    };

    let login = state
        .auth_manager
        .login(&payload.username, &payload.password)
        .await
        .map_err(internal)?;

    let Some((user, token)) = login else {
        metrics::login_attempt(false);
        log_security_event("failed_login", None, "Rejected credentials");
        return Err(api_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    };

    metrics::login_attempt(true);
    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Revoke the token this request was authenticated with.
///
/// Returns `204 No Content`. Other sessions of the same user stay valid.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<StatusCode, ApiError> {
    state.auth_manager.revoke_token(&token).await.map_err(|e| {
        tracing::error!("Logout failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.client_message())
    })?;

    tracing::info!(user_id = user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Return the authenticated user.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
