//! Register a new user
//!
//! Creates the account and signs it in, so the response already carries a
//! session token.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::issue_token;
use crate::auth::{hash_password, AuthError};
use crate::config::AuthConfig;
use crate::db::{self, DbError};
use crate::features::shared::validation::{
    validate_email, validate_password, validate_username, EmailValidationError,
    PasswordValidationError, UsernameValidationError,
};
use crate::features::users::types::{AuthTokenResponse, UserResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterUserError {
    #[error("{0}")]
    UsernameValidation(#[from] UsernameValidationError),

    #[error("{0}")]
    PasswordValidation(#[from] PasswordValidationError),

    #[error("{0}")]
    EmailValidation(#[from] EmailValidationError),

    #[error("A user with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("{0}")]
    Hash(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<AuthTokenResponse, RegisterUserError>> for RegisterUserCommand {}

impl crate::cqrs::middleware::Command for RegisterUserCommand {}

impl RegisterUserCommand {
    pub fn validate(&self) -> Result<(), RegisterUserError> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, auth, command), fields(username = %command.username))]
pub async fn handle(
    pool: SqlitePool,
    auth: AuthConfig,
    command: RegisterUserCommand,
) -> Result<AuthTokenResponse, RegisterUserError> {
    command.validate()?;

    let RegisterUserCommand {
        username,
        email,
        password,
    } = command;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RegisterUserError::Internal(e.to_string()))??;

    let email = email.filter(|e| !e.is_empty());
    let user = db::users::create(
        &pool,
        db::users::NewUser {
            username: &username,
            email: email.as_deref(),
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(|e| match e {
        DbError::Duplicate(_) => RegisterUserError::DuplicateUsername(username.clone()),
        other => RegisterUserError::Database(other),
    })?;

    let (token, expires_at) = issue_token(&pool, &auth, user.id).await?;

    tracing::info!(user_id = %user.id, "User registered");

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

    fn command(username: &str) -> RegisterUserCommand {
        RegisterUserCommand {
            username: username.to_string(),
            email: Some("ops@plant.example".to_string()),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_validation() {
        assert!(command("alice").validate().is_ok());

        let mut bad = command("alice");
        bad.password = "short".to_string();
        assert!(matches!(bad.validate(), Err(RegisterUserError::PasswordValidation(_))));

        let mut bad = command("alice");
        bad.email = Some("nope".to_string());
        assert!(matches!(bad.validate(), Err(RegisterUserError::EmailValidation(_))));

        let mut blank_email = command("alice");
        blank_email.email = Some(String::new());
        assert!(blank_email.validate().is_ok());

        assert!(matches!(
            command("").validate(),
            Err(RegisterUserError::UsernameValidation(_))
        ));
    }

    #[test]
    fn test_password_never_serialized() {
        let json = serde_json::to_value(command("alice")).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let pool = test_pool().await;
        let response = handle(pool.clone(), AuthConfig::default(), command("alice"))
            .await
            .unwrap();
        assert_eq!(response.user.username, "alice");
        assert_eq!(response.token.len(), 64);

        let stored = db::users::find_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "correct horse");
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let pool = test_pool().await;
        handle(pool.clone(), AuthConfig::default(), command("alice")).await.unwrap();
        let err = handle(pool, AuthConfig::default(), command("alice")).await.unwrap_err();
        assert!(matches!(err, RegisterUserError::DuplicateUsername(name) if name == "alice"));
    }
}
