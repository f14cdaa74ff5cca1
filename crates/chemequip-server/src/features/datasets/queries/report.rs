//! PDF report for one dataset
//!
//! The dataset row and its equipment are read in one transaction so the
//! report never mixes two states of the history.

use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, DbError};
use crate::report::{render_report, Report, ReportInput};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportQuery {
    pub user_id: Uuid,
    pub dataset_id: Uuid,
    /// Stamp the render time in the footer. The digest ignores it either way.
    #[serde(default = "default_include_timestamp")]
    pub include_timestamp: bool,
}

fn default_include_timestamp() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateReportError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl Request<Result<Report, GenerateReportError>> for GenerateReportQuery {}

impl crate::cqrs::middleware::Query for GenerateReportQuery {}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id, dataset_id = %query.dataset_id))]
pub async fn handle(pool: SqlitePool, query: GenerateReportQuery) -> Result<Report, GenerateReportError> {
    let map_err = |err: DbError| {
        if err.is_not_found() {
            GenerateReportError::NotFound(query.dataset_id)
        } else {
            GenerateReportError::Database(err)
        }
    };

    let mut tx = pool.begin().await.map_err(|e| map_err(e.into()))?;
    let dataset = db::datasets::get_owned(&mut *tx, query.user_id, query.dataset_id)
        .await
        .map_err(map_err)?;
    let equipment = db::datasets::list_equipment(&mut *tx, dataset.id)
        .await
        .map_err(map_err)?;
    tx.commit().await.map_err(|e| map_err(e.into()))?;

    let rendered_at = query.include_timestamp.then(Utc::now);
    let report = tokio::task::spawn_blocking(move || {
        render_report(
            &ReportInput {
                dataset: &dataset,
                equipment: &equipment,
            },
            rendered_at,
        )
    })
    .await
    .map_err(|e| GenerateReportError::Render(e.to_string()))?;

    tracing::info!(
        filename = %report.filename,
        size = report.bytes.len(),
        digest = %report.digest.short(),
        "Report rendered"
    );
    Ok(report)
}
