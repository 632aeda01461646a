//! SQLite-backed draft store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Hosts that want drafts to survive a restart open a file database here.
//! The schema is a single `draft_kv` table migrated on connect.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use super::{KeyValueStore, StoreError};
use crate::config::env_parse;
use crate::draft::now_ms;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 1;

fn db_max_connections(url: &str) -> u32 {
    // Each connection to an in-memory database sees its own database.
    if url.contains(":memory:") {
        return 1;
    }
    env_parse("DRAFT_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or the
    /// migrations fail.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let max_connections = db_max_connections(url);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("src/store/migrations").run(&pool).await?;
        info!(max_connections, "draft store connected");

        Ok(Self { pool })
    }

    /// Wrap an existing pool. The caller is responsible for migrations.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM draft_kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO draft_kv (key, value, updated_at)
              VALUES (?1, ?2, ?3)
              ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM draft_kv WHERE key = ?1").bind(key).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
