//! Summary statistics over a set of equipment records.
//!
//! A [`Summary`] is a pure function of the records folded into it. Callers
//! feed records in a fixed order (dataset upload order, then row position)
//! so that a recomputation reproduces a cached summary exactly, including
//! floating point rounding of the sums.

use super::equipment::{EquipmentRecord, EquipmentType, Parameter};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Power-of-two scale applied to the fallback sum. Exact, and keeps the sum
/// of any realistic row count of finite `f64`s finite.
const OVERFLOW_SCALE: f64 = 18_446_744_073_709_551_616.0; // 2^64

/// Running totals for one numeric parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterStats {
    pub count: u64,
    pub sum: f64,
    /// Sum of `value / 2^64`, used for the mean once `sum` overflows.
    pub scaled_sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterStats {
    pub fn push(&mut self, value: Option<f64>) {
        let Some(v) = value else {
            return;
        };
        self.count += 1;
        self.sum += v;
        self.scaled_sum += v / OVERFLOW_SCALE;
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }

    /// Mean over present values; absent when nothing was present.
    ///
    /// Always finite for finite inputs: a mean lies between min and max.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean = if self.sum.is_finite() {
            self.sum / n
        } else {
            self.scaled_sum / n * OVERFLOW_SCALE
        };
        // Rounding can push a mean of near-max values a hair past its bounds.
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(mean.clamp(min, max)),
            _ => Some(mean),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryAccumulator {
    total: u64,
    distribution: BTreeMap<EquipmentType, u64>,
    flowrate: ParameterStats,
    pressure: ParameterStats,
    temperature: ParameterStats,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        equipment_type: EquipmentType,
        flowrate: Option<f64>,
        pressure: Option<f64>,
        temperature: Option<f64>,
    ) {
        self.total += 1;
        *self.distribution.entry(equipment_type).or_insert(0) += 1;
        self.flowrate.push(flowrate);
        self.pressure.push(pressure);
        self.temperature.push(temperature);
    }

    pub fn push_record(&mut self, record: &EquipmentRecord) {
        self.push(record.equipment_type, record.flowrate, record.pressure, record.temperature);
    }

    pub fn stats(&self, parameter: Parameter) -> &ParameterStats {
        match parameter {
            Parameter::Flowrate => &self.flowrate,
            Parameter::Pressure => &self.pressure,
            Parameter::Temperature => &self.temperature,
        }
    }

    pub fn finish(self) -> Summary {
        Summary {
            total_equipment: self.total,
            equipment_type_distribution: self.distribution,
            avg_flowrate: self.flowrate.mean(),
            avg_pressure: self.pressure.mean(),
            avg_temperature: self.temperature.mean(),
            min_flowrate: self.flowrate.min,
            max_flowrate: self.flowrate.max,
            min_pressure: self.pressure.min,
            max_pressure: self.pressure.max,
            min_temperature: self.temperature.min,
            max_temperature: self.temperature.max,
        }
    }
}

/// Derived statistics for one dataset or for all of a user's equipment.
///
/// Absent averages and extremes serialize as `null`, never as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_equipment: u64,
    /// Only types that occur appear as keys.
    pub equipment_type_distribution: BTreeMap<EquipmentType, u64>,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    #[serde(default)]
    pub min_flowrate: Option<f64>,
    #[serde(default)]
    pub max_flowrate: Option<f64>,
    #[serde(default)]
    pub min_pressure: Option<f64>,
    #[serde(default)]
    pub max_pressure: Option<f64>,
    #[serde(default)]
    pub min_temperature: Option<f64>,
    #[serde(default)]
    pub max_temperature: Option<f64>,
}

impl Summary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a EquipmentRecord>) -> Self {
        let mut acc = SummaryAccumulator::new();
        for record in records {
            acc.push_record(record);
        }
        acc.finish()
    }

    pub fn average(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Flowrate => self.avg_flowrate,
            Parameter::Pressure => self.avg_pressure,
            Parameter::Temperature => self.avg_temperature,
        }
    }

    pub fn range(&self, parameter: Parameter) -> (Option<f64>, Option<f64>) {
        match parameter {
            Parameter::Flowrate => (self.min_flowrate, self.max_flowrate),
            Parameter::Pressure => (self.min_pressure, self.max_pressure),
            Parameter::Temperature => (self.min_temperature, self.max_temperature),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
