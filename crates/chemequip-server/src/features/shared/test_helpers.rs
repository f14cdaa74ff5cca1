//! Fixtures for in-crate database tests

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;

/// Fresh in-memory database with the schema applied.
pub async fn test_pool() -> SqlitePool {
    let pool = db::create_memory_pool().await.expect("in-memory pool");
    db::migrate(&pool).await.expect("migrations");
    pool
}

/// Insert a user with a throwaway password hash and return its id.
pub async fn create_user(pool: &SqlitePool, username: &str) -> Uuid {
    db::users::create(
        pool,
        db::users::NewUser {
            username,
            email: None,
            password_hash: "unused",
        },
    )
    .await
    .expect("create user")
    .id
}

/// Minimal well-formed upload body.
pub const SAMPLE_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
Pump-01,Pump,150.5,5.2,45.0\n\
Tank-02,Reactor,,3.1,80.0\n";
