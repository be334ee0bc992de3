//! Authentication module providing user registration, login, and session management.
//!
//! This module implements bearer-token authentication with:
//! - One-way password digests, compared in constant time
//! - Opaque random session tokens (256 bits, hex encoded)
//! - Store-clock token expiry (24 hours by default)
//! - Explicit, idempotent revocation
//!
//! ## Example
//!
//! ```no_run
//! use envkeep::auth::AuthManager;
//! use envkeep::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     db.migrate().await?;
//!     let auth = AuthManager::new(Arc::new(db.pool().clone()));
//!
//!     let user_id = auth.create_user("player1", "SecurePass123").await?;
//!     let token = auth.authenticate("player1", "SecurePass123").await?;
//!     println!("Registered user {user_id}, logged in: {}", token.is_some());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod token;

pub use errors::{AuthError, AuthResult};
pub use manager::{AuthManager, DEFAULT_TOKEN_EXPIRY_HOURS, MAX_TOKEN_EXPIRY_HOURS};
pub use models::{User, UserId};
