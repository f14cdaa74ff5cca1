//! Equipment API routes
//!
//! - `GET /api/v1/equipment?page=1&per_page=20` - All of the caller's equipment

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use sqlx::SqlitePool;

use super::queries::{ListEquipmentError, ListEquipmentQuery};
use crate::api::response::{codes, ApiResponse, ErrorResponse};
use crate::auth::AuthUser;

pub fn equipment_routes() -> Router<SqlitePool> {
    Router::new().route("/", get(list_equipment))
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn list_equipment(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Query(mut query): Query<ListEquipmentQuery>,
) -> Result<Response, EquipmentApiError> {
    query.user_id = user.user_id;
    let page = super::queries::list::handle(pool, query).await?;
    Ok(ApiResponse::success_with_meta(page.items, json!({ "pagination": page.pagination })).into_response())
}

#[derive(Debug)]
enum EquipmentApiError {
    List(ListEquipmentError),
}

impl From<ListEquipmentError> for EquipmentApiError {
    fn from(err: ListEquipmentError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for EquipmentApiError {
    fn into_response(self) -> Response {
        match self {
            EquipmentApiError::List(ref err @ ListEquipmentError::Pagination(_)) => {
                ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            EquipmentApiError::List(ref err @ ListEquipmentError::Database(_)) => {
                tracing::error!(error = %err, "Equipment listing failed");
                ErrorResponse::new(codes::INTERNAL_ERROR, "An internal error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

impl std::fmt::Display for EquipmentApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquipmentApiError::List(e) => write!(f, "{}", e),
        }
    }
}
