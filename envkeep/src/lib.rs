//! # envkeep
//!
//! Token-based authentication and environment-scoped configuration storage
//! backed by a single SQLite store.
//!
//! ## Core Modules
//!
//! - [`auth`]: User registration, credential verification, bearer token
//!   issuance, validation and revocation
//! - [`config`]: Key/value CRUD scoped by deployment environment, with
//!   substring search over keys
//! - [`db`]: Connection pool, schema migration and query timeouts
//!
//! Managers never reach for a global connection. The pool is opened once and
//! handed to each manager as an `Arc<SqlitePool>`.
//!
//! ## Example
//!
//! ```no_run
//! use envkeep::{auth::AuthManager, config::ConfigManager, db::{Database, DatabaseConfig}};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::in_memory()).await?;
//!     db.migrate().await?;
//!
//!     let pool = Arc::new(db.pool().clone());
//!     let auth = AuthManager::new(pool.clone());
//!     let config = ConfigManager::new(pool);
//!
//!     auth.create_user("alice", "hunter2pass").await?;
//!     if let Some(token) = auth.authenticate("alice", "hunter2pass").await? {
//!         config.set("feature.x", "on", None).await?;
//!         auth.revoke_token(&token).await?;
//!     }
//!     Ok(())
//! }
//! ```

/// Authentication and session management.
pub mod auth;

/// Environment-scoped configuration storage.
pub mod config;

/// Store handle, schema and query helpers.
pub mod db;

pub use auth::{AuthError, AuthManager, AuthResult, User, UserId};
pub use config::{ConfigEntry, ConfigError, ConfigManager, ConfigResult, Environment};
pub use db::{Database, DatabaseConfig};
