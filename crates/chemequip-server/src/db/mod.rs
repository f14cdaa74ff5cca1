//! SQLite persistence
//!
//! The pool runs in WAL mode so readers never block the single writer and
//! always observe either the state before or after an ingest transaction.

pub mod datasets;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed at startup
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation)
    #[error("{0}")]
    Duplicate(String),

    /// A stored value could not be mapped back into a domain type
    #[error("Stored value is invalid: {0}")]
    Corrupt(String),
}

impl DbError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} '{}' not found", resource_type, identifier))
    }

    /// Create a duplicate error with resource context
    pub fn duplicate(resource_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Busy timeout for writers waiting on the SQLite write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(config: &DatabaseConfig) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!(
        url = %config.url,
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Private in-memory database on a single long-lived connection.
///
/// Every connection to `sqlite::memory:` opens its own database, so the pool
/// is pinned to one connection that is never recycled.
pub async fn create_memory_pool() -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_migrates_and_answers() {
        let pool = create_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        health_check(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite%' AND name <> '_sqlx_migrations' \
             ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["auth_tokens", "datasets", "equipment", "users"]);
    }

    #[tokio::test]
    async fn test_file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("test.db").display()),
            max_connections: 2,
            connect_timeout_secs: 5,
        };
        let pool = create_pool(&config).await.unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode").fetch_one(&pool).await.unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_error_helpers() {
        let err = DbError::not_found("Dataset", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Dataset 'abc' not found");
        assert_eq!(
            DbError::duplicate("User", "alice").to_string(),
            "User 'alice' already exists"
        );
    }
}
