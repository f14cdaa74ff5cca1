//! Upload a CSV file as a new dataset
//!
//! Flow: metadata checks, parse and validate (on the blocking pool), build
//! records, then one transaction that stores the dataset and trims the
//! user's history. A rejected file leaves nothing behind.

use chemequip_common::checksum::Checksum;
use chemequip_common::Summary;
use chemequip_ingest::{build_records, CsvParser, IngestError, RowIssue};
use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::db::{self, datasets::NewDataset, DbError};
use crate::features::datasets::locks::UserLocks;
use crate::features::shared::validation::{sanitize_filename, FilenameValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDatasetCommand {
    pub user_id: Uuid,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDatasetResponse {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub equipment_count: i64,
    pub skipped_rows: i64,
    pub checksum: String,
    pub summary: Summary,
    /// Rows dropped under the skip policy, capped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadDatasetError {
    #[error("{0}")]
    Filename(#[from] FilenameValidationError),

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl Request<Result<UploadDatasetResponse, UploadDatasetError>> for UploadDatasetCommand {}

impl crate::cqrs::middleware::Command for UploadDatasetCommand {}

#[tracing::instrument(
    skip(pool, settings, locks, command),
    fields(
        user_id = %command.user_id,
        filename = %command.filename,
        size = command.content.len()
    )
)]
pub async fn handle(
    pool: SqlitePool,
    settings: IngestConfig,
    locks: UserLocks,
    command: UploadDatasetCommand,
) -> Result<UploadDatasetResponse, UploadDatasetError> {
    let filename = sanitize_filename(&command.filename)?;
    let UploadDatasetCommand {
        user_id,
        content_type,
        content,
        ..
    } = command;

    let parser = CsvParser::new(settings.parser_config());
    parser.check_upload(&filename, content_type.as_deref(), content.len())?;

    let checksum = Checksum::of_bytes(&content);
    let parse_name = filename.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        parser.parse(&parse_name, content_type.as_deref(), &content)
    })
    .await
    .map_err(|e| UploadDatasetError::Internal(e.to_string()))??;

    tracing::info!(
        accepted = outcome.stats.accepted_rows,
        skipped = outcome.stats.skipped_rows,
        checksum = %checksum.short(),
        "CSV parsed"
    );

    let _guard = locks.acquire(user_id).await;

    let dataset_id = Uuid::new_v4();
    let uploaded_at = Utc::now();
    let records = build_records(dataset_id, outcome.rows, uploaded_at);

    let ingested = db::datasets::ingest(
        &pool,
        NewDataset {
            id: dataset_id,
            user_id,
            filename,
            checksum: checksum.into(),
            skipped_rows: outcome.stats.skipped_rows as i64,
            uploaded_at,
            records,
        },
        settings.retention_limit,
    )
    .await?;

    let dataset = ingested.dataset;
    tracing::info!(
        dataset_id = %dataset.id,
        equipment_count = dataset.equipment_count,
        evicted = ingested.evicted.len(),
        "Dataset stored"
    );

    Ok(UploadDatasetResponse {
        id: dataset.id,
        filename: dataset.filename,
        uploaded_at: dataset.uploaded_at,
        equipment_count: dataset.equipment_count,
        skipped_rows: dataset.skipped_rows,
        checksum: dataset.checksum,
        summary: dataset.summary_stats,
        issues: outcome.issues,
    })
}
