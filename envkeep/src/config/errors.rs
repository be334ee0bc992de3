//! Configuration error types.

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Store failure, including a lost race between two `set` calls
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Environment name outside development, staging and production
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}

impl ConfigError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            ConfigError::Storage(_) => "Internal server error".to_string(),
            ConfigError::InvalidEnvironment(_) => self.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
