//! HTTP front end for envkeep.
//!
//! Exposes registration, login and logout, plus bearer-protected access to
//! environment-scoped configuration.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
