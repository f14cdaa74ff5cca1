use chemequip_common::EquipmentRecord;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, DbError};
use crate::features::shared::{Paginated, PaginationError, PaginationParams};

/// Every equipment record across the caller's retained datasets, oldest
/// dataset first and in file order within each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEquipmentQuery {
    #[serde(skip)]
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListEquipmentError {
    #[error("{0}")]
    Pagination(#[from] PaginationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<Paginated<EquipmentRecord>, ListEquipmentError>> for ListEquipmentQuery {}

impl crate::cqrs::middleware::Query for ListEquipmentQuery {}

impl ListEquipmentQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id))]
pub async fn handle(
    pool: SqlitePool,
    query: ListEquipmentQuery,
) -> Result<Paginated<EquipmentRecord>, ListEquipmentError> {
    let params = query.pagination();
    params.validate()?;

    let (items, total) =
        db::datasets::list_user_equipment_page(&pool, query.user_id, params.per_page(), params.offset())
            .await?;

    Ok(Paginated::from_items(items, &params, total))
}
