use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{self, DbError};

/// Revoke the token the request was authenticated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutCommand {
    pub token_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<LogoutResponse, LogoutError>> for LogoutCommand {}

impl crate::cqrs::middleware::Command for LogoutCommand {}

#[tracing::instrument(skip(pool, command))]
pub async fn handle(pool: SqlitePool, command: LogoutCommand) -> Result<LogoutResponse, LogoutError> {
    let revoked = db::users::delete_token(&pool, &command.token_hash).await?;
    tracing::info!(revoked, "Logout");
    Ok(LogoutResponse { revoked })
}
