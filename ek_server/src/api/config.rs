//! Configuration API handlers.
//!
//! Every handler accepts an optional `environment` query parameter
//! (`development`, `staging` or `production`). When omitted the manager's
//! default environment applies.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use envkeep::{ConfigEntry, ConfigError, Environment, User};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, api_error};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct EnvironmentQuery {
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub pattern: String,
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetConfigPayload {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigValueResponse {
    pub key: String,
    pub value: String,
    pub environment: Environment,
}

fn parse_environment(raw: Option<&str>) -> Result<Option<Environment>, ApiError> {
    raw.map(str::parse::<Environment>)
        .transpose()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.client_message()))
}

fn storage_failure(e: ConfigError) -> ApiError {
    tracing::error!("Config operation failed: {e}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.client_message())
}

/// List all entries of an environment, ordered by key.
pub async fn list_config(
    State(state): State<AppState>,
    Query(query): Query<EnvironmentQuery>,
) -> Result<Json<Vec<ConfigEntry>>, ApiError> {
    let environment = parse_environment(query.environment.as_deref())?;

    state
        .config_manager
        .get_all(environment)
        .await
        .map(Json)
        .map_err(storage_failure)
}

/// Entries whose key contains `pattern`, ordered by key.
pub async fn search_config(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ConfigEntry>>, ApiError> {
    let environment = parse_environment(query.environment.as_deref())?;

    state
        .config_manager
        .get_by_pattern(&query.pattern, environment)
        .await
        .map(Json)
        .map_err(storage_failure)
}

/// Read a single value.
///
/// # Errors
///
/// - `404 Not Found`: Key is not set in the environment
pub async fn get_config(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<EnvironmentQuery>,
) -> Result<Json<ConfigValueResponse>, ApiError> {
    let environment = parse_environment(query.environment.as_deref())?;

    let value = state
        .config_manager
        .get(&key, environment)
        .await
        .map_err(storage_failure)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Config key '{key}' not found")))?;

    Ok(Json(ConfigValueResponse {
        key,
        value,
        environment: environment.unwrap_or(state.config_manager.default_environment()),
    }))
}

/// Create or update a value.
pub async fn set_config(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(key): Path<String>,
    Query(query): Query<EnvironmentQuery>,
    Json(payload): Json<SetConfigPayload>,
) -> Result<Json<ConfigEntry>, ApiError> {
    let environment = parse_environment(query.environment.as_deref())?;

    let entry = state
        .config_manager
        .set(&key, &payload.value, environment)
        .await
        .map_err(storage_failure)?;

    metrics::config_write("set", entry.environment.as_str());
    tracing::info!(
        user_id = user.id,
        key = %entry.key,
        environment = %entry.environment,
        "Config set"
    );
    Ok(Json(entry))
}

/// Delete a value.
///
/// Returns `204 No Content`, or `404 Not Found` if nothing matched.
pub async fn delete_config(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(key): Path<String>,
    Query(query): Query<EnvironmentQuery>,
) -> Result<StatusCode, ApiError> {
    let environment = parse_environment(query.environment.as_deref())?;

    let removed = state
        .config_manager
        .delete(&key, environment)
        .await
        .map_err(storage_failure)?;

    if !removed {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Config key '{key}' not found"),
        ));
    }

    let environment = environment.unwrap_or(state.config_manager.default_environment());
    metrics::config_write("delete", environment.as_str());
    tracing::info!(user_id = user.id, key = %key, environment = %environment, "Config deleted");
    Ok(StatusCode::NO_CONTENT)
}
