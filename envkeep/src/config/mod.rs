//! Environment-scoped configuration storage.
//!
//! Keys live in one namespace per [`Environment`]; the same key may hold
//! different values in development, staging and production.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use models::{ConfigEntry, Environment};
