//! Bearer-token authentication middleware for protected endpoints.
//!
//! Extracts the token from `Authorization: Bearer <token>`, resolves it with
//! [`AuthManager::validate_token`](envkeep::AuthManager::validate_token), and
//! injects the caller's [`User`] and [`BearerToken`] into request extensions.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use envkeep::User;
//!
//! async fn protected_handler(Extension(user): Extension<User>) -> String {
//!     format!("Authenticated as {}", user.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::{logging::log_security_event, metrics};

/// The raw token the request was authenticated with
#[derive(Clone, Debug)]
pub struct BearerToken(pub String);

/// Authentication middleware that validates bearer tokens and injects the user.
///
/// - **Success**: token valid → injects `User` and `BearerToken` → calls next handler
/// - **Missing or malformed header**: `401 Unauthorized`
/// - **Unknown, revoked or expired token**: `401 Unauthorized`
/// - **Store failure**: `500 Internal Server Error`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.auth_manager.validate_token(&token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            request.extensions_mut().insert(BearerToken(token));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            metrics::token_rejected();
            log_security_event("invalid_token", None, "Rejected bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(e) => {
            tracing::error!("Token validation failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
