//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use envkeep::{Environment, auth::MAX_TOKEN_EXPIRY_HOURS, db::DatabaseConfig};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Lifetime of issued tokens in hours
    pub token_expiry_hours: i64,
    /// How often expired tokens are swept, in seconds
    pub token_purge_interval_secs: u64,
    /// Environment used when a request names none
    pub default_environment: Environment,
    /// Prometheus exporter address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ServerConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?.unwrap_or_else(default_bind),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let default_environment = match std::env::var("DEFAULT_ENVIRONMENT") {
            Ok(value) => value.parse().map_err(|_| ServerConfigError::Invalid {
                var: "DEFAULT_ENVIRONMENT".to_string(),
                reason: format!("Unknown environment '{value}'"),
            })?,
            Err(_) => Environment::default(),
        };

        Ok(ServerConfig {
            bind,
            database,
            token_expiry_hours: parse_env_or(
                "TOKEN_EXPIRY_HOURS",
                envkeep::auth::DEFAULT_TOKEN_EXPIRY_HOURS,
            ),
            token_purge_interval_secs: parse_env_or("TOKEN_PURGE_INTERVAL_SECS", 3600),
            default_environment,
            metrics_bind: parse_addr("METRICS_BIND")?,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ServerConfigError> {
        if self.token_expiry_hours <= 0 {
            return Err(ServerConfigError::Invalid {
                var: "TOKEN_EXPIRY_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.token_expiry_hours > MAX_TOKEN_EXPIRY_HOURS {
            return Err(ServerConfigError::Invalid {
                var: "TOKEN_EXPIRY_HOURS".to_string(),
                reason: format!("Must not exceed {MAX_TOKEN_EXPIRY_HOURS}"),
            });
        }

        if self.token_purge_interval_secs == 0 {
            return Err(ServerConfigError::Invalid {
                var: "TOKEN_PURGE_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ServerConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ServerConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Must not exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Token lifetime as a duration
    ///
    /// # Errors
    ///
    /// Returns error if the hour count does not fit a duration
    pub fn token_expiry(&self) -> Result<chrono::Duration, ServerConfigError> {
        chrono::Duration::try_hours(self.token_expiry_hours).ok_or_else(|| {
            ServerConfigError::Invalid {
                var: "TOKEN_EXPIRY_HOURS".to_string(),
                reason: format!("{} hours is out of range", self.token_expiry_hours),
            }
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ServerConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ServerConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not an IP:PORT address"),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
