//! Store query timeout helpers
//!
//! The managers never time out on their own. Callers that own a request
//! deadline wrap store futures with these helpers.

use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for a single store round-trip (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for timeout operations
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E: std::error::Error + 'static> {
    /// Operation timed out
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// The wrapped operation failed
    #[error(transparent)]
    Inner(E),
}

/// Result type for timeout operations
pub type TimeoutResult<T, E> = Result<T, TimeoutError<E>>;

/// Execute a store operation with timeout
///
/// # Example
///
/// ```no_run
/// use envkeep::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// # use sqlx::SqlitePool;
/// # async fn example(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
///
/// with_timeout(DEFAULT_QUERY_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> TimeoutResult<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Timeout(duration)),
    }
}

/// Execute a store operation with the default timeout (5 seconds)
pub async fn with_default_timeout<F, T, E>(future: F) -> TimeoutResult<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}
