use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::issue_token;
use crate::auth::verify_password;
use crate::config::AuthConfig;
use crate::db::{self, DbError};
use crate::features::users::types::{AuthTokenResponse, UserResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,

    /// Same error for an unknown user and a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<AuthTokenResponse, LoginError>> for LoginCommand {}

impl crate::cqrs::middleware::Command for LoginCommand {}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, auth, command), fields(username = %command.username))]
pub async fn handle(
    pool: SqlitePool,
    auth: AuthConfig,
    command: LoginCommand,
) -> Result<AuthTokenResponse, LoginError> {
    command.validate()?;

    let Some(user) = db::users::find_by_username(&pool, &command.username).await? else {
        tracing::info!("Login for unknown user");
        return Err(LoginError::InvalidCredentials);
    };

    let hash = user.password_hash.clone();
    let password = command.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| LoginError::Internal(e.to_string()))?;
    if !valid {
        tracing::info!(user_id = %user.id, "Login with wrong password");
        return Err(LoginError::InvalidCredentials);
    }

    let (token, expires_at) = issue_token(&pool, &auth, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(AuthTokenResponse {
        token,
        expires_at,
        user: UserResponse::from(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::test_pool;
    use crate::features::users::commands::register::{self, RegisterUserCommand};

    async fn registered_pool() -> SqlitePool {
        let pool = test_pool().await;
        register::handle(
            pool.clone(),
            AuthConfig::default(),
            RegisterUserCommand {
                username: "alice".to_string(),
                email: None,
                password: "correct horse".to_string(),
            },
        )
        .await
        .unwrap();
        pool
    }

    fn login(username: &str, password: &str) -> LoginCommand {
        LoginCommand {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let pool = registered_pool().await;
        let response = handle(pool, AuthConfig::default(), login("alice", "correct horse"))
            .await
            .unwrap();
        assert_eq!(response.user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_failures_look_alike() {
        let pool = registered_pool().await;

        let wrong_password = handle(pool.clone(), AuthConfig::default(), login("alice", "wrong horse"))
            .await
            .unwrap_err();
        let unknown_user = handle(pool, AuthConfig::default(), login("mallory", "correct horse"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, LoginError::InvalidCredentials));
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(login("", "x").validate(), Err(LoginError::MissingCredentials)));
    }
}
