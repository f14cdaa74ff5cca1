use chemequip_common::EquipmentRecord;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, DbError};

/// Equipment rows of one owned dataset, in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetEquipmentQuery {
    pub user_id: Uuid,
    pub dataset_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetEquipmentError {
    #[error("Dataset '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl Request<Result<Vec<EquipmentRecord>, ListDatasetEquipmentError>> for ListDatasetEquipmentQuery {}

impl crate::cqrs::middleware::Query for ListDatasetEquipmentQuery {}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id, dataset_id = %query.dataset_id))]
pub async fn handle(
    pool: SqlitePool,
    query: ListDatasetEquipmentQuery,
) -> Result<Vec<EquipmentRecord>, ListDatasetEquipmentError> {
    let map_err = |err: DbError| {
        if err.is_not_found() {
            ListDatasetEquipmentError::NotFound(query.dataset_id)
        } else {
            ListDatasetEquipmentError::Database(err)
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

    Ok(equipment)
}
