//! Statistics across every retained dataset of one user

use chemequip_common::Summary;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, datasets::Dataset, DbError};

/// Datasets listed alongside the global summary.
pub const RECENT_DATASETS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSummaryQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalSummary {
    #[serde(flatten)]
    pub summary: Summary,
    pub recent_datasets: Vec<Dataset>,
}

#[derive(Debug, thiserror::Error)]
pub enum GlobalSummaryError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<GlobalSummary, GlobalSummaryError>> for GlobalSummaryQuery {}

impl crate::cqrs::middleware::Query for GlobalSummaryQuery {}

/// Folds the stored rows rather than merging cached per-dataset summaries,
/// so min/max and averages are exact over the union.
#[tracing::instrument(skip(pool), fields(user_id = %query.user_id))]
pub async fn handle(pool: SqlitePool, query: GlobalSummaryQuery) -> Result<GlobalSummary, GlobalSummaryError> {
    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let summary = db::datasets::fold_user_equipment(&mut *tx, query.user_id).await?;
    let recent_datasets = db::datasets::list_recent(&mut *tx, query.user_id, RECENT_DATASETS).await?;
    tx.commit().await.map_err(DbError::from)?;

    Ok(GlobalSummary {
        summary,
        recent_datasets,
    })
}
