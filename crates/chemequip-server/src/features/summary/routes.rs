//! Summary API routes
//!
//! - `GET /api/v1/summary` - Statistics over all of the caller's equipment

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::SqlitePool;

use super::queries::{GlobalSummaryError, GlobalSummaryQuery};
use crate::api::response::{codes, ApiResponse, ErrorResponse};
use crate::auth::AuthUser;

pub fn summary_routes() -> Router<SqlitePool> {
    Router::new().route("/", get(global_summary))
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn global_summary(State(pool): State<SqlitePool>, user: AuthUser) -> Result<Response, SummaryApiError> {
    let query = GlobalSummaryQuery {
        user_id: user.user_id,
    };
    let response = super::queries::global::handle(pool, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug)]
struct SummaryApiError(GlobalSummaryError);

impl From<GlobalSummaryError> for SummaryApiError {
    fn from(err: GlobalSummaryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SummaryApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Global summary failed");
        ErrorResponse::new(codes::INTERNAL_ERROR, "An internal error occurred")
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
