//! Decision Threshold Configuration
//!
//! Quản lý ngưỡng cắt cho regression score.
//! The cut is a fixed policy constant: scores are not calibrated
//! probabilities, so there is no "right" value to derive from them.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MLP_THRESHOLD;
use crate::error::{DetectorError, DetectorResult};

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scores strictly above this are anomalies
    pub base_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            base_threshold: DEFAULT_MLP_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn new(base: f64) -> Self {
        Self {
            base_threshold: base,
        }
    }

    pub fn validate(&self) -> DetectorResult<()> {
        if !self.base_threshold.is_finite() {
            return Err(DetectorError::invalid(format!(
                "decision threshold must be finite, got {}",
                self.base_threshold
            )));
        }
        Ok(())
    }

    /// Check if score exceeds threshold
    pub fn is_anomaly(&self, score: f64) -> bool {
        score > self.base_threshold
    }

    pub fn apply(&self, scores: &Array1<f64>) -> Vec<bool> {
        scores.iter().map(|&s| self.is_anomaly(s)).collect()
    }
}
