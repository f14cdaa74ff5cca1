//! Page/per-page handling for list queries
//!
//! ```rust,ignore
//! let params = PaginationParams::new(Some(2), Some(20));
//! let (items, total) = db::datasets::list_page(&pool, user, params.per_page(), params.offset()).await?;
//! let page = Paginated::from_items(items, &params, total);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be greater than 0")]
    InvalidPage,

    #[error("per_page must be between 1 and 100")]
    InvalidPerPage,
}

/// Page request, 1-indexed. Missing values fall back to page 1 and
/// [`DEFAULT_PER_PAGE`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PaginationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Row offset for the SQL `OFFSET` clause.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// Reject explicit out-of-range values instead of silently clamping them.
    pub fn validate(&self) -> Result<(), PaginationError> {
        if matches!(self.page, Some(page) if page < 1) {
            return Err(PaginationError::InvalidPage);
        }
        if matches!(self.per_page, Some(n) if !(1..=MAX_PER_PAGE).contains(&n)) {
            return Err(PaginationError::InvalidPerPage);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMetadata {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total <= 0 { 0 } else { (total + per_page - 1) / per_page };
        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

/// A page of items plus where it sits in the full result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T> Paginated<T> {
    pub fn from_items(items: Vec<T>, params: &PaginationParams, total: i64) -> Self {
        Self {
            items,
            pagination: PaginationMetadata::new(params.page(), params.per_page(), total),
        }
    }
}
