//! Validated rows to equipment records

use crate::csv_parser::ValidatedRow;
use chemequip_common::EquipmentRecord;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Attach every row to `dataset_id`, giving each a fresh id and its
/// position in upload order. One record per row, nothing dropped.
pub fn build_records(
    dataset_id: Uuid,
    rows: Vec<ValidatedRow>,
    created_at: DateTime<Utc>,
) -> Vec<EquipmentRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(position, row)| EquipmentRecord {
            id: Uuid::new_v4(),
            dataset_id,
            position: position as i64,
            name: row.name,
            equipment_type: row.equipment_type,
            flowrate: row.flowrate,
            pressure: row.pressure,
            temperature: row.temperature,
            created_at,
        })
        .collect()
}
