pub mod login;
pub mod logout;
pub mod register;

pub use login::{LoginCommand, LoginError};
pub use logout::{LogoutCommand, LogoutError, LogoutResponse};
pub use register::{RegisterUserCommand, RegisterUserError};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::{generate_token, token_digest};
use crate::config::AuthConfig;
use crate::db::{self, DbResult};

/// Mint a token for `user_id` and store its digest.
pub(crate) async fn issue_token(
    pool: &SqlitePool,
    auth: &AuthConfig,
    user_id: Uuid,
) -> DbResult<(String, DateTime<Utc>)> {
    let token = generate_token();
    let expires_at = Utc::now() + auth.token_ttl();
    db::users::insert_token(pool, &token_digest(&token), user_id, expires_at).await?;
    Ok((token, expires_at))
}
