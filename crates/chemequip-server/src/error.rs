//! Errors raised outside the feature slices
//!
//! Feature handlers map their own error enums to responses; this type covers
//! the shared plumbing (authentication, health checks).

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::{codes, ErrorResponse};
use crate::db::DbError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(message) => {
                let mut response =
                    ErrorResponse::new(codes::UNAUTHORIZED, message).into_response_with(StatusCode::UNAUTHORIZED);
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Token"));
                response
            },
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                ErrorResponse::new(codes::INTERNAL_ERROR, "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
            AppError::Internal(message) => {
                tracing::error!(%message, "Internal error");
                ErrorResponse::new(codes::INTERNAL_ERROR, "An internal error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_sets_challenge() {
        let response = AppError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");
    }

    #[test]
    fn test_internal_hides_message() {
        let response = AppError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
