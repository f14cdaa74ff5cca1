use crate::error::ChemEquipError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of recognised equipment types.
///
/// Unrecognised labels resolve to [`EquipmentType::Other`] instead of being
/// rejected, so distribution counts are always keyed by a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EquipmentType {
    Pump,
    Compressor,
    HeatExchanger,
    Reactor,
    Separator,
    Column,
    Other,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 7] = [
        EquipmentType::Pump,
        EquipmentType::Compressor,
        EquipmentType::HeatExchanger,
        EquipmentType::Reactor,
        EquipmentType::Separator,
        EquipmentType::Column,
        EquipmentType::Other,
    ];

    /// Canonical display label, also used as the stored value.
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentType::Pump => "Pump",
            EquipmentType::Compressor => "Compressor",
            EquipmentType::HeatExchanger => "Heat Exchanger",
            EquipmentType::Reactor => "Reactor",
            EquipmentType::Separator => "Separator",
            EquipmentType::Column => "Column",
            EquipmentType::Other => "Other",
        }
    }

    /// Resolve a free-text cell value.
    ///
    /// Matching trims the input, collapses internal runs of whitespace and
    /// ignores ASCII case, so `"  heat   EXCHANGER "` is a heat exchanger.
    /// Anything else is `Other`.
    pub fn resolve(raw: &str) -> Self {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized))
            .unwrap_or(EquipmentType::Other)
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for EquipmentType {
    type Err = ChemEquipError;

    /// Strict parse of a canonical label, as written by [`EquipmentType::as_str`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ChemEquipError::UnknownEquipmentType(s.to_string()))
    }
}

impl TryFrom<String> for EquipmentType {
    type Error = ChemEquipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EquipmentType> for String {
    fn from(value: EquipmentType) -> Self {
        value.as_str().to_string()
    }
}

/// Numeric reading carried by every equipment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Flowrate,
    Pressure,
    Temperature,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [Parameter::Flowrate, Parameter::Pressure, Parameter::Temperature];

    pub fn label(self) -> &'static str {
        match self {
            Parameter::Flowrate => "Flowrate",
            Parameter::Pressure => "Pressure",
            Parameter::Temperature => "Temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Flowrate => "L/min",
            Parameter::Pressure => "bar",
            Parameter::Temperature => "\u{b0}C",
        }
    }
}

/// One ingested row, owned by exactly one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub id: Uuid,
    pub dataset_id: Uuid,
    /// Zero-based order of the row within its dataset.
    pub position: i64,
    pub name: String,
    pub equipment_type: EquipmentType,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl EquipmentRecord {
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Flowrate => self.flowrate,
            Parameter::Pressure => self.pressure,
            Parameter::Temperature => self.temperature,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_types() {
        assert_eq!(EquipmentType::resolve("Pump"), EquipmentType::Pump);
        assert_eq!(EquipmentType::resolve("  reactor "), EquipmentType::Reactor);
        assert_eq!(EquipmentType::resolve("heat   EXCHANGER"), EquipmentType::HeatExchanger);
        assert_eq!(EquipmentType::resolve("other"), EquipmentType::Other);
    }

    #[test]
    fn test_resolve_falls_back_to_other() {
        assert_eq!(EquipmentType::resolve("Unknown"), EquipmentType::Other);
        assert_eq!(EquipmentType::resolve(""), EquipmentType::Other);
        assert_eq!(EquipmentType::resolve("HeatExchanger"), EquipmentType::Other);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!("Heat Exchanger".parse::<EquipmentType>().unwrap(), EquipmentType::HeatExchanger);
        assert!("pump".parse::<EquipmentType>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&EquipmentType::HeatExchanger).unwrap();
        assert_eq!(json, "\"Heat Exchanger\"");
        let back: EquipmentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EquipmentType::HeatExchanger);
    }

    #[test]
    fn test_record_value_lookup() {
        let record = EquipmentRecord {
            id: Uuid::new_v4(),
            dataset_id: Uuid::new_v4(),
            position: 0,
            name: "Pump-01".to_string(),
            equipment_type: EquipmentType::Pump,
            flowrate: Some(150.5),
            pressure: None,
            temperature: Some(45.2),
            created_at: Utc::now(),
        };
        assert_eq!(record.value(Parameter::Flowrate), Some(150.5));
        assert_eq!(record.value(Parameter::Pressure), None);
        assert_eq!(record.value(Parameter::Temperature), Some(45.2));
    }
}
