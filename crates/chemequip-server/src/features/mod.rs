//! Feature slices
//!
//! Each slice holds `commands/` (writes), `queries/` (reads) and a
//! `routes.rs` that maps HTTP onto them:
//!
//! - **users**: registration, login/logout, current user
//! - **datasets**: CSV upload, dataset listing and detail, per-dataset
//!   summary and PDF report
//! - **equipment**: every equipment record the caller owns
//! - **summary**: aggregate statistics across the caller's datasets

pub mod datasets;
pub mod equipment;
pub mod shared;
pub mod summary;
pub mod users;

use axum::extract::FromRef;
use axum::Router;
use sqlx::SqlitePool;

use crate::config::{AuthConfig, IngestConfig};
use datasets::locks::UserLocks;

/// State handed to the feature routers.
#[derive(Clone, FromRef)]
pub struct FeatureState {
    pub db: SqlitePool,
    pub ingest: IngestConfig,
    pub auth: AuthConfig,
    pub locks: UserLocks,
}

impl FeatureState {
    pub fn new(db: SqlitePool, ingest: IngestConfig, auth: AuthConfig) -> Self {
        Self {
            db,
            ingest,
            auth,
            locks: UserLocks::default(),
        }
    }
}

/// Mounts every slice under its own prefix:
/// `/users`, `/datasets`, `/equipment` and `/summary`.
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/users", users::users_routes().with_state(state.clone()))
        .nest("/datasets", datasets::datasets_routes(&state.ingest).with_state(state.clone()))
        .nest("/equipment", equipment::equipment_routes().with_state(state.db.clone()))
        .nest("/summary", summary::summary_routes().with_state(state.db))
}
