use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, datasets::Dataset, DbError};
use crate::features::shared::{Paginated, PaginationError, PaginationParams};

/// The caller's datasets, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    #[serde(skip)]
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error("{0}")]
    Pagination(#[from] PaginationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<Paginated<Dataset>, ListDatasetsError>> for ListDatasetsQuery {}

impl crate::cqrs::middleware::Query for ListDatasetsQuery {}

impl ListDatasetsQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn validate(&self) -> Result<(), ListDatasetsError> {
        self.pagination().validate()?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool), fields(user_id = %query.user_id))]
pub async fn handle(
    pool: SqlitePool,
    query: ListDatasetsQuery,
) -> Result<Paginated<Dataset>, ListDatasetsError> {
    query.validate()?;
    let params = query.pagination();

    let (items, total) =
        db::datasets::list_page(&pool, query.user_id, params.per_page(), params.offset()).await?;

    Ok(Paginated::from_items(items, &params, total))
}
