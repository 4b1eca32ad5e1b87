//! Dataset Module - Synthetic Traffic Table
//!
//! Holds the labeled traffic records an engine trains on and re-scores.
//! Records are never reordered or removed; each detection pass only
//! overwrites their decision fields.

pub mod record;
pub mod generator;

#[cfg(test)]
mod tests;

use ndarray::{Array1, Array2};

use crate::error::{DetectorError, DetectorResult};
use crate::logic::features::FEATURE_COUNT;
pub use generator::{GeneratorConfig, TrafficGenerator};
pub use record::{Decisions, TrafficRecord};

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TrafficRecord>,
}

impl Dataset {
    pub fn new(records: Vec<TrafficRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrafficRecord] {
        &self.records
    }

    /// Feature matrix in `FEATURE_LAYOUT` order, one row per record
    pub fn feature_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.records.len(), FEATURE_COUNT), |(i, _)| {
            self.records[i].data_size
        })
    }

    /// `is_attack` as regression targets (0.0 / 1.0)
    pub fn labels(&self) -> Array1<f64> {
        self.records
            .iter()
            .map(|r| if r.is_attack { 1.0 } else { 0.0 })
            .collect()
    }

    /// Overwrite the decision fields of every record
    pub fn apply_decisions(&mut self, decisions: &[Decisions]) -> DetectorResult<()> {
        if decisions.len() != self.records.len() {
            return Err(DetectorError::invalid(format!(
                "decision column has {} entries, dataset has {} records",
                decisions.len(),
                self.records.len()
            )));
        }

        for (record, decision) in self.records.iter_mut().zip(decisions) {
            record.decisions = Some(*decision);
        }
        Ok(())
    }

    /// Records whose combined decision is set, in dataset order
    pub fn anomalies(&self) -> Vec<TrafficRecord> {
        self.records.iter().filter(|r| r.is_anomaly()).cloned().collect()
    }

    pub fn attack_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_attack).count()
    }
}
