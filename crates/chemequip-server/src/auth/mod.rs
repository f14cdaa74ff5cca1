//! Password hashing, session tokens and the authenticated-user extractor
//!
//! Tokens are 32 random bytes, hex encoded, handed to the client once. The
//! database only ever sees their SHA-256 digest.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chemequip_common::checksum::Checksum;
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
}

/// Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// False for a wrong password and for a hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        },
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage form of a token.
pub fn token_digest(token: &str) -> String {
    Checksum::of_bytes(token.as_bytes()).into()
}

/// Pull the key out of `Token <key>` or `Bearer <key>`.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(key)
    } else {
        None
    }
}

/// The user behind the request's session token.
///
/// Handlers that take an `AuthUser` reject anonymous or expired requests
/// with 401 before any of their own code runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    /// Digest of the presented token, kept so logout can revoke it.
    pub token_hash: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided".into()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed Authorization header".into()))?;

        let token = parse_authorization(header_value)
            .ok_or_else(|| AppError::Unauthorized("Expected 'Token <key>' authorization".into()))?;

        let pool = SqlitePool::from_ref(state);
        let token_hash = token_digest(token);
        let session = db::users::resolve_token(&pool, &token_hash, Utc::now())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id: session.user_id,
            username: session.username,
            token_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not a phc string"));
    }

    #[test]
    fn test_tokens_are_random_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_ne!(token_digest(&a), a);
        assert_eq!(token_digest(&a), token_digest(&a));
    }

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Token abc123"), Some("abc123"));
        assert_eq!(parse_authorization("bearer abc123"), Some("abc123"));
        assert_eq!(parse_authorization("Basic abc123"), None);
        assert_eq!(parse_authorization("Token "), None);
        assert_eq!(parse_authorization("abc123"), None);
    }
}
