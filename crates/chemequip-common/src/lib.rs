//! ChemEquip Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Domain types, aggregation, checksums and logging shared by the ChemEquip
//! workspace members.
//!
//! # Overview
//!
//! - **Types**: [`EquipmentType`], [`EquipmentRecord`] and the [`Summary`]
//!   statistics derived from a set of records
//! - **Checksums**: SHA-256 content digests for uploads and reports
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```
//! use chemequip_common::types::{EquipmentType, Summary, SummaryAccumulator};
//!
//! let mut acc = SummaryAccumulator::new();
//! acc.push(EquipmentType::Pump, Some(150.5), Some(10.5), Some(45.2));
//! acc.push(EquipmentType::Other, None, None, None);
//! let summary: Summary = acc.finish();
//!
//! assert_eq!(summary.total_equipment, 2);
//! assert_eq!(summary.avg_flowrate, Some(150.5));
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{ChemEquipError, Result};
pub use types::{EquipmentRecord, EquipmentType, Parameter, Summary, SummaryAccumulator};
