//! Database error classification

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    match error {
        SqlxError::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
