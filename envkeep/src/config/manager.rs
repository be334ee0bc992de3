//! Configuration manager implementation.

use super::{
    errors::ConfigResult,
    models::{ConfigEntry, Environment},
};
use crate::db::schema::NOW;
use chrono::NaiveDateTime;
use log::{debug, info};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::sync::Arc;

const ENTRY_COLUMNS: &str = "id, key, value, environment, created_at, updated_at";

/// Configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    pool: Arc<SqlitePool>,
    default_environment: Environment,
}

impl ConfigManager {
    /// Create a new configuration manager scoped to `production` by default
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self::with_default_environment(pool, Environment::default())
    }

    /// Create a new configuration manager with a different default environment
    pub fn with_default_environment(pool: Arc<SqlitePool>, default_environment: Environment) -> Self {
        Self {
            pool,
            default_environment,
        }
    }

    /// Environment used when a call omits one
    pub fn default_environment(&self) -> Environment {
        self.default_environment
    }

    fn resolve(&self, environment: Option<Environment>) -> Environment {
        environment.unwrap_or(self.default_environment)
    }

    /// Insert or update a key
    ///
    /// An existing `(key, environment)` row keeps its `id` and `created_at`;
    /// only `value` and `updated_at` change.
    ///
    /// The lookup and the write are separate statements. Two concurrent
    /// calls for a new pair can race: one of them fails on the unique
    /// constraint with `ConfigError::Storage`, or one update is lost.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        environment: Option<Environment>,
    ) -> ConfigResult<ConfigEntry> {
        let environment = self.resolve(environment);

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM config WHERE key = ?1 AND environment = ?2")
                .bind(key)
                .bind(environment.as_str())
                .fetch_optional(self.pool.as_ref())
                .await?;

        let id = match existing {
            Some(id) => {
                sqlx::query(&format!(
                    "UPDATE config SET value = ?1, updated_at = {NOW} WHERE id = ?2"
                ))
                .bind(value)
                .bind(id)
                .execute(self.pool.as_ref())
                .await?;
                id
            }
            None => sqlx::query("INSERT INTO config (key, value, environment) VALUES (?1, ?2, ?3)")
                .bind(key)
                .bind(value)
                .bind(environment.as_str())
                .execute(self.pool.as_ref())
                .await?
                .last_insert_rowid(),
        };

        info!("Set config {key} in {environment}");

        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM config WHERE id = ?1"))
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;
        entry_from_row(&row)
    }

    /// Get the value of a key
    pub async fn get(&self, key: &str, environment: Option<Environment>) -> ConfigResult<Option<String>> {
        let environment = self.resolve(environment);

        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM config WHERE key = ?1 AND environment = ?2")
                .bind(key)
                .bind(environment.as_str())
                .fetch_optional(self.pool.as_ref())
                .await?;

        debug!("Config lookup {key} in {environment}");
        Ok(value)
    }

    /// All entries of an environment, ordered by key
    pub async fn get_all(&self, environment: Option<Environment>) -> ConfigResult<Vec<ConfigEntry>> {
        let environment = self.resolve(environment);

        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config WHERE environment = ?1 ORDER BY key ASC"
        ))
        .bind(environment.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Delete a key
    ///
    /// # Returns
    ///
    /// * `ConfigResult<bool>` - Whether a row was removed
    pub async fn delete(&self, key: &str, environment: Option<Environment>) -> ConfigResult<bool> {
        let environment = self.resolve(environment);

        let removed = sqlx::query("DELETE FROM config WHERE key = ?1 AND environment = ?2")
            .bind(key)
            .bind(environment.as_str())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        if removed > 0 {
            info!("Deleted config {key} in {environment}");
        }
        Ok(removed > 0)
    }

    /// Whether a key is set
    pub async fn exists(&self, key: &str, environment: Option<Environment>) -> ConfigResult<bool> {
        let environment = self.resolve(environment);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM config WHERE key = ?1 AND environment = ?2")
                .bind(key)
                .bind(environment.as_str())
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count > 0)
    }

    /// Entries whose key contains `pattern` anywhere, ordered by key
    ///
    /// Matching is a literal, case-sensitive substring test; `%` and `_`
    /// have no special meaning. An empty pattern matches every key.
    pub async fn get_by_pattern(
        &self,
        pattern: &str,
        environment: Option<Environment>,
    ) -> ConfigResult<Vec<ConfigEntry>> {
        let environment = self.resolve(environment);

        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config \
             WHERE environment = ?1 AND instr(key, ?2) > 0 \
             ORDER BY key ASC"
        ))
        .bind(environment.as_str())
        .bind(pattern)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: &SqliteRow) -> ConfigResult<ConfigEntry> {
    Ok(ConfigEntry {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        environment: row.try_get::<String, _>("environment")?.parse()?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        updated_at: row.try_get::<NaiveDateTime, _>("updated_at")?.and_utc(),
    })
}
