//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{User, UserId},
    password::{hash_password, verify_password},
    token::generate_token,
};
use crate::db::{is_unique_violation, schema::NOW};
use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::sync::Arc;

/// Default lifetime of an issued token
pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Longest lifetime a token can be given (ten years). Expiries past the
/// store's date range would leave `expires_at` NULL.
pub const MAX_TOKEN_EXPIRY_HOURS: i64 = 87_600;

/// Stand-in digest compared against when the username is unknown, so both
/// rejection paths do the same work. No password hashes to all zeros.
const UNKNOWN_USER_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    pool: Arc<SqlitePool>,
    token_expiry: Duration,
}

impl AuthManager {
    /// Create a new authentication manager with the default 24 hour token expiry
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self::with_token_expiry(pool, Duration::hours(DEFAULT_TOKEN_EXPIRY_HOURS))
    }

    /// Create a new authentication manager with a custom token expiry
    ///
    /// A zero or negative expiry issues tokens that are already expired.
    /// Expiries above `MAX_TOKEN_EXPIRY_HOURS` are clamped to it.
    pub fn with_token_expiry(pool: Arc<SqlitePool>, token_expiry: Duration) -> Self {
        let max = Duration::hours(MAX_TOKEN_EXPIRY_HOURS);
        if token_expiry > max {
            warn!("Token expiry clamped to {MAX_TOKEN_EXPIRY_HOURS} hours");
        }
        Self {
            pool,
            token_expiry: token_expiry.min(max),
        }
    }

    /// Lifetime given to newly issued tokens
    pub fn token_expiry(&self) -> Duration {
        self.token_expiry
    }

    /// Create a new user
    ///
    /// The password is hashed before it reaches the store. Format and
    /// strength policy belong to the caller.
    ///
    /// # Errors
    ///
    /// * `AuthError::DuplicateUsername` - Username already exists
    /// * `AuthError::Storage` - Any other store failure
    pub async fn create_user(&self, username: &str, password: &str) -> AuthResult<UserId> {
        let password_hash = hash_password(password);

        // Uniqueness is left to the constraint so concurrent registrations
        // cannot both pass a pre-check.
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?1, ?2)")
            .bind(username)
            .bind(&password_hash)
            .execute(self.pool.as_ref())
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    warn!("Registration rejected: username already exists");
                    AuthError::DuplicateUsername
                } else {
                    AuthError::Storage(err)
                }
            })?;

        let user_id = result.last_insert_rowid();
        info!("Created user {user_id}");
        Ok(user_id)
    }

    /// Verify credentials and issue a new token
    ///
    /// Returns `None` when the username is unknown or the password is wrong.
    /// Both paths hash the candidate and run a full constant-time compare.
    /// Every success issues a fresh token; existing tokens stay valid.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<Option<String>> {
        Ok(self
            .login(username, password)
            .await?
            .map(|(_, token)| token))
    }

    /// Same as [`authenticate`](Self::authenticate), also returning the
    /// user the token was issued to
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Option<(User, String)>> {
        let row = sqlx::query(
            "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let (user, stored_hash) = match row {
            Some(row) => (
                Some(user_from_row(&row)?),
                row.try_get::<String, _>("password_hash")?,
            ),
            None => (None, UNKNOWN_USER_HASH.to_string()),
        };

        let matches = verify_password(password, &stored_hash);

        let Some(user) = user.filter(|_| matches) else {
            debug!("Authentication rejected");
            return Ok(None);
        };

        let token = self.issue_token(user.id).await?;
        info!("Issued token for user {}", user.id);
        Ok(Some((user, token)))
    }

    /// Insert a token row whose expiry is computed by the store
    async fn issue_token(&self, user_id: UserId) -> AuthResult<String> {
        let token = generate_token();

        sqlx::query(
            "INSERT INTO tokens (user_id, token, expires_at) \
             VALUES (?1, ?2, strftime('%Y-%m-%d %H:%M:%f', 'now', ?3))",
        )
        .bind(user_id)
        .bind(&token)
        .bind(expiry_modifier(self.token_expiry))
        .execute(self.pool.as_ref())
        .await?;

        Ok(token)
    }

    /// Resolve a token to its user
    ///
    /// Returns `None` for unknown, revoked and expired tokens. Expiry is
    /// judged against the store's clock. Validation never extends a token.
    pub async fn validate_token(&self, token: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT u.id, u.username, u.created_at
            FROM tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = ?1 AND t.expires_at > {NOW}
            "#
        ))
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(user_from_row).transpose().map_err(AuthError::from)
    }

    /// Revoke a token. Unknown and expired tokens are a silent no-op.
    pub async fn revoke_token(&self, token: &str) -> AuthResult<()> {
        let result = sqlx::query("DELETE FROM tokens WHERE token = ?1")
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() > 0 {
            info!("Revoked token {}...", token_prefix(token));
        }
        Ok(())
    }

    /// Revoke every token held by a user
    ///
    /// # Returns
    ///
    /// * `AuthResult<u64>` - Number of tokens removed
    pub async fn revoke_all_tokens(&self, user_id: UserId) -> AuthResult<u64> {
        let removed = sqlx::query("DELETE FROM tokens WHERE user_id = ?1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        info!("Revoked {removed} token(s) for user {user_id}");
        Ok(removed)
    }

    /// Delete tokens whose expiry has passed on the store's clock
    pub async fn purge_expired_tokens(&self) -> AuthResult<u64> {
        let removed = sqlx::query(&format!("DELETE FROM tokens WHERE expires_at <= {NOW}"))
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if removed > 0 {
            info!("Purged {removed} expired token(s)");
        }
        Ok(removed)
    }

    /// Look up a user by ID
    pub async fn get_user_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(user_from_row).transpose().map_err(AuthError::from)
    }

    /// Look up a user by username
    pub async fn get_user_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(user_from_row).transpose().map_err(AuthError::from)
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
    })
}

/// SQLite date modifier for an offset, e.g. `+86400.000 seconds`
fn expiry_modifier(expiry: Duration) -> String {
    format!("{:+.3} seconds", expiry.num_milliseconds() as f64 / 1000.0)
}

fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
