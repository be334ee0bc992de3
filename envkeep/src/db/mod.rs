//! Database module providing the SQLite connection pool and schema.
//!
//! This module owns the store handle shared by the auth and config managers.
//! The store serializes writers; the managers rely on its constraints rather
//! than on in-process locking.

use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub mod config;
pub mod schema;
pub mod timeouts;

pub use config::DatabaseConfig;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a new connection pool
    ///
    /// File databases run in WAL mode (many readers, one writer). In-memory
    /// databases are pinned to one connection that never expires, since the
    /// database disappears with its last connection.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use envkeep::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::from_env();
    ///     let db = Database::new(&config).await?;
    ///     db.migrate().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let timeout = Duration::from_secs(config.connection_timeout_secs);

        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(timeout);

        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
                .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        };

        let pool = pool_options
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        debug!("Opened database pool for {}", config.database_url);
        Ok(Self { pool })
    }

    /// Apply the schema. Safe to run on every startup.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(schema::SCHEMA_SQL).execute(&self.pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Whether a store error is a uniqueness-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(&DatabaseConfig::in_memory())
            .await
            .expect("Failed to open in-memory database");
        db.migrate().await.expect("Migration failed");
        db.health_check().await.expect("Health check failed");
        db.close().await;
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::new(&DatabaseConfig::in_memory()).await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'tokens', 'config') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["config", "tokens", "users"]);
    }

    #[tokio::test]
    async fn test_unique_violation_is_recognized() {
        let db = Database::new(&DatabaseConfig::in_memory()).await.unwrap();
        db.migrate().await.unwrap();

        let insert = "INSERT INTO users (username, password_hash) VALUES ('dup', 'x')";
        sqlx::query(insert).execute(db.pool()).await.unwrap();
        let err = sqlx::query(insert).execute(db.pool()).await.unwrap_err();
        assert!(is_unique_violation(&err));

        let other = sqlx::query("SELECT * FROM missing_table")
            .execute(db.pool())
            .await
            .unwrap_err();
        assert!(!is_unique_violation(&other));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_tokens() {
        let db = Database::new(&DatabaseConfig::in_memory()).await.unwrap();
        db.migrate().await.unwrap();

        let user_id = sqlx::query("INSERT INTO users (username, password_hash) VALUES ('u', 'h')")
            .execute(db.pool())
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO tokens (user_id, token, expires_at) VALUES (?1, 't', '9999-01-01 00:00:00.000')")
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
