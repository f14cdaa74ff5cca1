//! Upload rejection reasons

use crate::csv_parser::RowIssue;
use thiserror::Error;

/// Why an upload was rejected as a whole. Nothing is persisted for any of
/// these.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file '{filename}' must have a .csv extension")]
    InvalidExtension { filename: String },

    #[error("unsupported content type '{0}', expected a CSV file")]
    UnsupportedContentType(String),

    #[error("file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("file is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("file is empty, expected a header row")]
    MissingHeader,

    #[error("header must be '{expected}', found '{found}'")]
    InvalidHeader { expected: String, found: String },

    #[error("file has more than {limit} data rows")]
    TooManyRows { limit: usize },

    #[error("file contains a header but no data rows")]
    NoDataRows,

    #[error("no valid rows: all {skipped} data rows were rejected")]
    NoValidRows { skipped: usize, issues: Vec<RowIssue> },

    #[error("{0}")]
    InvalidRow(RowIssue),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl IngestError {
    /// Size violations map to a distinct status at the HTTP layer.
    pub fn is_too_large(&self) -> bool {
        matches!(self, IngestError::TooLarge { .. })
    }
}
