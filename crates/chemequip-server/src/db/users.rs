//! Users and session tokens

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{DbError, DbResult};
use crate::features::shared::error_helpers::is_unique_violation;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: &'a str,
}

pub async fn create(pool: &SqlitePool, user: NewUser<'_>) -> DbResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, username, email, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, username, email, password_hash, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::duplicate("User", user.username)
        } else {
            DbError::Sqlx(e)
        }
    })?;

    Ok(row)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> DbResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> DbResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::not_found("User", id))
}

pub async fn insert_token(
    pool: &SqlitePool,
    token_hash: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO auth_tokens (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Session resolved from a presented token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Look up the session for `token_hash`. Expired tokens are deleted and
/// reported as absent.
pub async fn resolve_token(
    pool: &SqlitePool,
    token_hash: &str,
    now: DateTime<Utc>,
) -> DbResult<Option<SessionRow>> {
    let session = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT t.user_id, u.username, t.expires_at
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) if session.expires_at <= now => {
            tracing::debug!(user_id = %session.user_id, "Discarding expired token");
            delete_token(pool, token_hash).await?;
            Ok(None)
        },
        other => Ok(other),
    }
}

/// Returns whether a token was removed.
pub async fn delete_token(pool: &SqlitePool, token_hash: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::test_pool;

    fn alice() -> NewUser<'static> {
        NewUser {
            username: "alice",
            email: Some("alice@example.com"),
            password_hash: "not-a-real-hash",
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = test_pool().await;
        let created = create(&pool, alice()).await.unwrap();

        let found = find_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email.as_deref(), Some("alice@example.com"));

        let by_id = find_by_id(&pool, created.id).await.unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let pool = test_pool().await;
        create(&pool, alice()).await.unwrap();
        let err = create(&pool, alice()).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let pool = test_pool().await;
        let user = create(&pool, alice()).await.unwrap();
        let now = Utc::now();

        insert_token(&pool, "live", user.id, now + chrono::Duration::hours(1))
            .await
            .unwrap();
        insert_token(&pool, "stale", user.id, now - chrono::Duration::hours(1))
            .await
            .unwrap();

        let session = resolve_token(&pool, "live", now).await.unwrap().unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.username, "alice");

        assert!(resolve_token(&pool, "stale", now).await.unwrap().is_none());
        assert!(!delete_token(&pool, "stale").await.unwrap());

        assert!(delete_token(&pool, "live").await.unwrap());
        assert!(resolve_token(&pool, "live", now).await.unwrap().is_none());
    }
}
