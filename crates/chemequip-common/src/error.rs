//! Error types shared across ChemEquip crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, ChemEquipError>;

#[derive(Error, Debug)]
pub enum ChemEquipError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown equipment type: {0}")]
    UnknownEquipmentType(String),
}
