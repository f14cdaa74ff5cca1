//! User API routes
//!
//! - `POST /api/v1/users/register` - Create an account and sign in
//! - `POST /api/v1/users/login` - Exchange credentials for a token
//! - `POST /api/v1/users/logout` - Revoke the presented token
//! - `GET /api/v1/users/me` - The authenticated user

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::SqlitePool;

use super::{
    commands::{LoginCommand, LoginError, LogoutCommand, LogoutError, RegisterUserCommand, RegisterUserError},
    queries::{GetCurrentUserError, GetCurrentUserQuery},
};
use crate::api::response::{codes, ApiResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::AuthConfig;
use crate::features::FeatureState;

pub fn users_routes() -> Router<FeatureState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// `POST /api/v1/users/register`
///
/// - `201 Created` - Account created, body carries the token
/// - `400 Bad Request` - Invalid username, password or email
/// - `409 Conflict` - Username taken
#[tracing::instrument(skip(pool, auth, command), fields(username = %command.username))]
async fn register(
    State(pool): State<SqlitePool>,
    State(auth): State<AuthConfig>,
    Json(command): Json<RegisterUserCommand>,
) -> Result<Response, UsersApiError> {
    let response = super::commands::register::handle(pool, auth, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// `POST /api/v1/users/login`
///
/// - `200 OK` - Token issued
/// - `401 Unauthorized` - Unknown user or wrong password
#[tracing::instrument(skip(pool, auth, command), fields(username = %command.username))]
async fn login(
    State(pool): State<SqlitePool>,
    State(auth): State<AuthConfig>,
    Json(command): Json<LoginCommand>,
) -> Result<Response, UsersApiError> {
    let response = super::commands::login::handle(pool, auth, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn logout(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Response, UsersApiError> {
    let command = LogoutCommand {
        token_hash: user.token_hash,
    };
    let response = super::commands::logout::handle(pool, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn me(State(pool): State<SqlitePool>, user: AuthUser) -> Result<Response, UsersApiError> {
    let query = GetCurrentUserQuery {
        user_id: user.user_id,
    };
    let response = super::queries::me::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum UsersApiError {
    Register(RegisterUserError),
    Login(LoginError),
    Logout(LogoutError),
    Me(GetCurrentUserError),
}

impl From<RegisterUserError> for UsersApiError {
    fn from(err: RegisterUserError) -> Self {
        Self::Register(err)
    }
}

impl From<LoginError> for UsersApiError {
    fn from(err: LoginError) -> Self {
        Self::Login(err)
    }
}

impl From<LogoutError> for UsersApiError {
    fn from(err: LogoutError) -> Self {
        Self::Logout(err)
    }
}

impl From<GetCurrentUserError> for UsersApiError {
    fn from(err: GetCurrentUserError) -> Self {
        Self::Me(err)
    }
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!(error = %err, "{}", context);
    ErrorResponse::new(codes::INTERNAL_ERROR, "An internal error occurred")
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for UsersApiError {
    fn into_response(self) -> Response {
        match self {
            UsersApiError::Register(
                ref err @ (RegisterUserError::UsernameValidation(_)
                | RegisterUserError::PasswordValidation(_)
                | RegisterUserError::EmailValidation(_)),
            ) => ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string())
                .into_response_with(StatusCode::BAD_REQUEST),
            UsersApiError::Register(ref err @ RegisterUserError::DuplicateUsername(_)) => {
                ErrorResponse::new(codes::CONFLICT, err.to_string()).into_response_with(StatusCode::CONFLICT)
            },
            UsersApiError::Register(
                ref err @ (RegisterUserError::Hash(_)
                | RegisterUserError::Internal(_)
                | RegisterUserError::Database(_)),
            ) => internal_error("User registration failed", err),

            UsersApiError::Login(ref err @ LoginError::MissingCredentials) => {
                ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            UsersApiError::Login(ref err @ LoginError::InvalidCredentials) => {
                ErrorResponse::new(codes::UNAUTHORIZED, err.to_string())
                    .into_response_with(StatusCode::UNAUTHORIZED)
            },
            UsersApiError::Login(ref err @ (LoginError::Internal(_) | LoginError::Database(_))) => {
                internal_error("Login failed", err)
            },

            UsersApiError::Logout(ref err) => internal_error("Logout failed", err),

            UsersApiError::Me(ref err @ GetCurrentUserError::NotFound) => {
                ErrorResponse::new(codes::NOT_FOUND, err.to_string()).into_response_with(StatusCode::NOT_FOUND)
            },
            UsersApiError::Me(ref err @ GetCurrentUserError::Database(_)) => {
                internal_error("Current user lookup failed", err)
            },
        }
    }
}

impl std::fmt::Display for UsersApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsersApiError::Register(e) => write!(f, "{}", e),
            UsersApiError::Login(e) => write!(f, "{}", e),
            UsersApiError::Logout(e) => write!(f, "{}", e),
            UsersApiError::Me(e) => write!(f, "{}", e),
        }
    }
}
