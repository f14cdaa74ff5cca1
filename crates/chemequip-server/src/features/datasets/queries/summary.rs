//! Per-dataset statistics, recomputed from the stored rows

use chemequip_common::Summary;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummaryQuery {
    pub user_id: Uuid,
    pub dataset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummaryResponse {
    pub dataset_id: Uuid,
    pub filename: String,
    #[serde(flatten)]
    pub summary: Summary,
    /// Whether the summary cached at upload time equals the recomputed one.
    pub matches_cached: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetSummaryError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl Request<Result<DatasetSummaryResponse, DatasetSummaryError>> for DatasetSummaryQuery {}

impl crate::cqrs::middleware::Query for DatasetSummaryQuery {}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id, dataset_id = %query.dataset_id))]
pub async fn handle(
    pool: SqlitePool,
    query: DatasetSummaryQuery,
) -> Result<DatasetSummaryResponse, DatasetSummaryError> {
    let map_err = |err: DbError| {
        if err.is_not_found() {
            DatasetSummaryError::NotFound(query.dataset_id)
        } else {
            DatasetSummaryError::Database(err)
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

    let summary = Summary::from_records(&equipment);
    let matches_cached = summary == dataset.summary_stats;
    if !matches_cached {
        tracing::warn!(dataset_id = %dataset.id, "Cached summary differs from stored rows");
    }

    Ok(DatasetSummaryResponse {
        dataset_id: dataset.id,
        filename: dataset.filename,
        summary,
        matches_cached,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::features::datasets::commands::{upload, UploadDatasetCommand};
    use crate::features::datasets::locks::UserLocks;
    use crate::features::shared::test_helpers::{create_user, test_pool, SAMPLE_CSV};

    #[tokio::test]
    async fn test_recomputed_summary_matches_cached() {
        let pool = test_pool().await;
        let user = create_user(&pool, "alice").await;
        let uploaded = upload::handle(
            pool.clone(),
            IngestConfig::default(),
            UserLocks::default(),
            UploadDatasetCommand {
                user_id: user,
                filename: "plant.csv".to_string(),
                content_type: None,
                content: SAMPLE_CSV.as_bytes().to_vec(),
            },
        )
        .await
        .unwrap();

        let response = handle(pool, DatasetSummaryQuery { user_id: user, dataset_id: uploaded.id })
            .await
            .unwrap();
        assert!(response.matches_cached);
        assert_eq!(response.summary, uploaded.summary);
        assert_eq!(response.summary.total_equipment, 2);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_equipment"], 2);
        assert_eq!(json["avg_flowrate"], 150.5);
    }

    #[tokio::test]
    async fn test_missing_dataset() {
        let pool = test_pool().await;
        let user = create_user(&pool, "alice").await;
        let err = handle(pool, DatasetSummaryQuery { user_id: user, dataset_id: Uuid::new_v4() })
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetSummaryError::NotFound(_)));
    }
}
