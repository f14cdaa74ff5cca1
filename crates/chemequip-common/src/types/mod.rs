//! Domain types shared by the ingest pipeline and the server

mod equipment;
mod summary;

pub use equipment::{EquipmentRecord, EquipmentType, Parameter};
pub use summary::{ParameterStats, Summary, SummaryAccumulator};
