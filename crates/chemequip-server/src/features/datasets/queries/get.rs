use chemequip_common::EquipmentRecord;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, datasets::Dataset, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetQuery {
    pub user_id: Uuid,
    pub dataset_id: Uuid,
}

/// A dataset together with its equipment rows in upload order.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub equipment: Vec<EquipmentRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl Request<Result<DatasetDetail, GetDatasetError>> for GetDatasetQuery {}

impl crate::cqrs::middleware::Query for GetDatasetQuery {}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id, dataset_id = %query.dataset_id))]
pub async fn handle(pool: SqlitePool, query: GetDatasetQuery) -> Result<DatasetDetail, GetDatasetError> {
    let map_err = |err: DbError| {
        if err.is_not_found() {
            GetDatasetError::NotFound(query.dataset_id)
        } else {
            GetDatasetError::Database(err)
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

    Ok(DatasetDetail { dataset, equipment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::features::datasets::commands::{upload, UploadDatasetCommand};
    use crate::features::datasets::locks::UserLocks;
    use crate::features::shared::test_helpers::{create_user, test_pool, SAMPLE_CSV};

    async fn upload_sample(pool: &SqlitePool, user_id: Uuid) -> Uuid {
        upload::handle(
            pool.clone(),
            IngestConfig::default(),
            UserLocks::default(),
            UploadDatasetCommand {
                user_id,
                filename: "plant.csv".to_string(),
                content_type: None,
                content: SAMPLE_CSV.as_bytes().to_vec(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_get_with_equipment() {
        let pool = test_pool().await;
        let user = create_user(&pool, "alice").await;
        let id = upload_sample(&pool, user).await;

        let detail = handle(pool, GetDatasetQuery { user_id: user, dataset_id: id })
            .await
            .unwrap();
        assert_eq!(detail.dataset.id, id);
        assert_eq!(detail.equipment.len(), 2);
        assert_eq!(detail.equipment[0].name, "Pump-01");
        assert_eq!(detail.equipment[1].name, "Tank-02");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["filename"], "plant.csv");
        assert!(json.get("user_id").is_none());
        assert_eq!(json["equipment"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_other_users_dataset_is_not_found() {
        let pool = test_pool().await;
        let alice = create_user(&pool, "alice").await;
        let bob = create_user(&pool, "bob").await;
        let id = upload_sample(&pool, alice).await;

        let err = handle(pool, GetDatasetQuery { user_id: bob, dataset_id: id })
            .await
            .unwrap_err();
        assert!(matches!(err, GetDatasetError::NotFound(found) if found == id));
    }
}
