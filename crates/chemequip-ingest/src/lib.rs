//! ChemEquip Ingest Library
//!
//! Turns an uploaded equipment CSV into validated rows and then into
//! [`EquipmentRecord`](chemequip_common::EquipmentRecord)s owned by a dataset.
//! Persistence is left to the caller.
//!
//! # Example
//!
//! ```
//! use chemequip_ingest::{build_records, CsvParser, ParserConfig};
//! use chemequip_common::{EquipmentType, Summary};
//!
//! let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
//!            Pump-01,Pump,150.5,10.5,45.2\n\
//!            Tank-02,Unknown,,,\n";
//!
//! let outcome = CsvParser::new(ParserConfig::default())
//!     .parse("plant.csv", Some("text/csv"), csv.as_bytes())
//!     .unwrap();
//! let records = build_records(uuid::Uuid::new_v4(), outcome.rows, chrono::Utc::now());
//!
//! assert_eq!(records[1].equipment_type, EquipmentType::Other);
//! assert_eq!(Summary::from_records(&records).avg_flowrate, Some(150.5));
//! ```

pub mod builder;
pub mod csv_parser;
pub mod error;

pub use builder::build_records;
pub use csv_parser::{
    CsvParser, ParseOutcome, ParseStats, ParserConfig, RowErrorPolicy, RowIssue, ValidatedRow,
    REQUIRED_COLUMNS,
};
pub use error::IngestError;
