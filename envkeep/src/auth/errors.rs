//! Authentication error types.
//!
//! Rejected credentials and unknown tokens are not errors. They come back as
//! `None` from the manager so callers cannot tell the causes apart.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username already exists
    #[error("Username already exists")]
    DuplicateUsername,

    /// Any other store failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Storage(_) => "Internal server error".to_string(),
            AuthError::DuplicateUsername => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
