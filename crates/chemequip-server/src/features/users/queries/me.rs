use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, DbError};
use crate::features::users::types::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCurrentUserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCurrentUserError {
    #[error("User not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DbError> for GetCurrentUserError {
    fn from(err: DbError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Database(err)
        }
    }
}

impl Request<Result<UserResponse, GetCurrentUserError>> for GetCurrentUserQuery {}

impl crate::cqrs::middleware::Query for GetCurrentUserQuery {}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id))]
pub async fn handle(
    pool: SqlitePool,
    query: GetCurrentUserQuery,
) -> Result<UserResponse, GetCurrentUserError> {
    let user = db::users::find_by_id(&pool, query.user_id).await?;
    Ok(user.into())
}
