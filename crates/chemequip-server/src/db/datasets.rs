//! Dataset store and retention
//!
//! A dataset and all of its equipment are written in one transaction that
//! also trims the owner's history to the retention limit. Everything else
//! in here is a read scoped to a single user.

use chemequip_common::{EquipmentRecord, EquipmentType, Summary, SummaryAccumulator};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{DbError, DbResult};

/// Rows per multi-value INSERT; keeps bound parameters well under SQLite's limit.
const INSERT_BATCH: usize = 500;

const DATASET_COLUMNS: &str =
    "id, user_id, filename, uploaded_at, equipment_count, skipped_rows, checksum, summary_stats";

const EQUIPMENT_COLUMNS: &str =
    "e.id, e.dataset_id, e.position, e.name, e.equipment_type, e.flowrate, e.pressure, e.temperature, e.created_at";

/// Stored dataset with its cached summary.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub equipment_count: i64,
    pub skipped_rows: i64,
    pub checksum: String,
    pub summary_stats: Summary,
}

#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: Uuid,
    user_id: Uuid,
    filename: String,
    uploaded_at: DateTime<Utc>,
    equipment_count: i64,
    skipped_rows: i64,
    checksum: String,
    summary_stats: Json<Summary>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            filename: row.filename,
            uploaded_at: row.uploaded_at,
            equipment_count: row.equipment_count,
            skipped_rows: row.skipped_rows,
            checksum: row.checksum,
            summary_stats: row.summary_stats.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EquipmentRow {
    id: Uuid,
    dataset_id: Uuid,
    position: i64,
    name: String,
    equipment_type: String,
    flowrate: Option<f64>,
    pressure: Option<f64>,
    temperature: Option<f64>,
    created_at: DateTime<Utc>,
}

impl EquipmentRow {
    fn into_record(self) -> DbResult<EquipmentRecord> {
        let equipment_type: EquipmentType = self
            .equipment_type
            .parse()
            .map_err(|e: chemequip_common::ChemEquipError| DbError::Corrupt(e.to_string()))?;
        Ok(EquipmentRecord {
            id: self.id,
            dataset_id: self.dataset_id,
            position: self.position,
            name: self.name,
            equipment_type,
            flowrate: self.flowrate,
            pressure: self.pressure,
            temperature: self.temperature,
            created_at: self.created_at,
        })
    }
}

/// Everything needed to persist one upload.
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub checksum: String,
    pub skipped_rows: i64,
    pub uploaded_at: DateTime<Utc>,
    pub records: Vec<EquipmentRecord>,
}

#[derive(Debug, Clone)]
pub struct Ingested {
    pub dataset: Dataset,
    /// Datasets removed by the retention trim, oldest last.
    pub evicted: Vec<Uuid>,
}

/// Persist a dataset with its equipment and enforce `retention_limit`.
///
/// The dataset row is inserted first so the transaction holds SQLite's
/// write lock before anything is read. The trim then counts the owner's
/// datasets inside the same transaction, so two uploads can never both
/// see a stale count. The new dataset itself is never evicted.
#[tracing::instrument(
    skip(pool, new),
    fields(dataset_id = %new.id, user_id = %new.user_id, records = new.records.len())
)]
pub async fn ingest(pool: &SqlitePool, new: NewDataset, retention_limit: i64) -> DbResult<Ingested> {
    let summary = Summary::from_records(&new.records);
    let equipment_count = new.records.len() as i64;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO datasets
            (id, user_id, filename, uploaded_at, equipment_count, skipped_rows, checksum, summary_stats)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.id)
    .bind(new.user_id)
    .bind(&new.filename)
    .bind(new.uploaded_at)
    .bind(equipment_count)
    .bind(new.skipped_rows)
    .bind(&new.checksum)
    .bind(Json(&summary))
    .execute(&mut *tx)
    .await?;

    for chunk in new.records.chunks(INSERT_BATCH) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO equipment \
             (id, dataset_id, position, name, equipment_type, flowrate, pressure, temperature, created_at) ",
        );
        builder.push_values(chunk, |mut b, record| {
            b.push_bind(record.id)
                .push_bind(record.dataset_id)
                .push_bind(record.position)
                .push_bind(record.name.as_str())
                .push_bind(record.equipment_type.as_str())
                .push_bind(record.flowrate)
                .push_bind(record.pressure)
                .push_bind(record.temperature)
                .push_bind(record.created_at);
        });
        builder.build().execute(&mut *tx).await?;
    }

    let evicted: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM datasets
        WHERE user_id = ? AND id <> ?
        ORDER BY uploaded_at DESC, seq DESC
        LIMIT -1 OFFSET ?
        "#,
    )
    .bind(new.user_id)
    .bind(new.id)
    .bind((retention_limit - 1).max(0))
    .fetch_all(&mut *tx)
    .await?;

    for id in &evicted {
        sqlx::query("DELETE FROM datasets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    for id in &evicted {
        tracing::info!(evicted_id = %id, user_id = %new.user_id, "Dataset evicted by retention limit");
    }

    Ok(Ingested {
        dataset: Dataset {
            id: new.id,
            user_id: new.user_id,
            filename: new.filename,
            uploaded_at: new.uploaded_at,
            equipment_count,
            skipped_rows: new.skipped_rows,
            checksum: new.checksum,
            summary_stats: summary,
        },
        evicted,
    })
}

/// The user's newest datasets, newest first.
pub async fn list_recent<'e, E>(executor: E, user_id: Uuid, limit: i64) -> DbResult<Vec<Dataset>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, DatasetRow>(&format!(
        "SELECT {DATASET_COLUMNS} FROM datasets WHERE user_id = ? \
         ORDER BY uploaded_at DESC, seq DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Dataset::from).collect())
}

/// One page of the user's datasets, newest first, with the total count.
///
/// Count and page are read in one transaction so they describe the same
/// snapshot even while another upload trims the history.
pub async fn list_page(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> DbResult<(Vec<Dataset>, i64)> {
    let mut tx = pool.begin().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let rows = sqlx::query_as::<_, DatasetRow>(&format!(
        "SELECT {DATASET_COLUMNS} FROM datasets WHERE user_id = ? \
         ORDER BY uploaded_at DESC, seq DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((rows.into_iter().map(Dataset::from).collect(), total))
}

/// Fetch a dataset owned by `user_id`.
///
/// A dataset that exists but belongs to someone else is reported exactly
/// like a missing one.
pub async fn get_owned<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> DbResult<Dataset>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, DatasetRow>(&format!(
        "SELECT {DATASET_COLUMNS} FROM datasets WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) if row.user_id == user_id => Ok(row.into()),
        Some(row) => {
            tracing::warn!(
                dataset_id = %id,
                owner_id = %row.user_id,
                requester_id = %user_id,
                "Dataset requested by a user who does not own it"
            );
            Err(DbError::not_found("Dataset", id))
        },
        None => Err(DbError::not_found("Dataset", id)),
    }
}

/// Equipment of one dataset in row order. Ownership is the caller's check.
pub async fn list_equipment<'e, E>(executor: E, dataset_id: Uuid) -> DbResult<Vec<EquipmentRecord>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment e WHERE e.dataset_id = ? ORDER BY e.position"
    ))
    .bind(dataset_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(EquipmentRow::into_record).collect()
}

/// One page of all the user's equipment, oldest dataset first.
pub async fn list_user_equipment_page(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> DbResult<(Vec<EquipmentRecord>, i64)> {
    let mut tx = pool.begin().await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM equipment e JOIN datasets d ON d.id = e.dataset_id WHERE d.user_id = ?",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment e JOIN datasets d ON d.id = e.dataset_id \
         WHERE d.user_id = ? ORDER BY d.seq, e.position LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let records = rows
        .into_iter()
        .map(EquipmentRow::into_record)
        .collect::<DbResult<Vec<_>>>()?;
    Ok((records, total))
}

/// Summary over every equipment record the user owns.
///
/// Records are streamed in (dataset sequence, position) order so repeated
/// folds over the same rows produce identical floating point sums.
pub async fn fold_user_equipment<'e, E>(executor: E, user_id: Uuid) -> DbResult<Summary>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment e JOIN datasets d ON d.id = e.dataset_id \
         WHERE d.user_id = ? ORDER BY d.seq, e.position"
    );
    let mut rows = sqlx::query_as::<_, EquipmentRow>(&sql)
        .bind(user_id)
        .fetch(executor);

    let mut acc = SummaryAccumulator::new();
    while let Some(row) = rows.try_next().await? {
        acc.push_record(&row.into_record()?);
    }
    Ok(acc.finish())
}
