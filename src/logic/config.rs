//! Detector Configuration
//!
//! Gom cấu hình của generator, hai scorer và log writer vào một chỗ.
//! Defaults live in `crate::constants`; `from_env` layers environment
//! overrides on top of them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::DetectorResult;
use crate::logic::dataset::GeneratorConfig;
use crate::logic::model::{IsolationConfig, MlpConfig, ThresholdConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub generator: GeneratorConfig,
    pub isolation: IsolationConfig,
    pub mlp: MlpConfig,
    pub threshold: ThresholdConfig,
    /// Anomaly log, opened in append mode
    pub log_path: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            isolation: IsolationConfig::default(),
            mlp: MlpConfig::default(),
            threshold: ThresholdConfig::default(),
            log_path: PathBuf::from(constants::DEFAULT_LOG_PATH),
        }
    }
}

impl DetectorConfig {
    /// Defaults overridden by `DETECTOR_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default().with_seed(constants::get_seed());
        config.generator.record_count = constants::get_record_count();
        config.isolation.contamination = constants::get_contamination();
        config.threshold = ThresholdConfig::new(constants::get_mlp_threshold());
        config.log_path = PathBuf::from(constants::get_log_path());
        config
    }

    pub fn with_record_count(mut self, record_count: usize) -> Self {
        self.generator.record_count = record_count;
        self
    }

    /// One seed drives generation, tree sampling and weight init
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator.seed = seed;
        self.isolation.seed = seed;
        self.mlp.seed = seed;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn validate(&self) -> DetectorResult<()> {
        self.generator.validate()?;
        self.isolation.validate()?;
        self.mlp.validate()?;
        self.threshold.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectorError;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.generator.record_count, 1000);
        assert_eq!(config.isolation.contamination, 0.05);
        assert_eq!(config.threshold.base_threshold, 0.5);
        assert_eq!(config.mlp.hidden_layer_sizes, vec![10, 5]);
        assert_eq!(config.log_path, PathBuf::from("mock_anomaly_logs.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_is_shared() {
        let config = DetectorConfig::default().with_seed(7);
        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.isolation.seed, 7);
        assert_eq!(config.mlp.seed, 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = DetectorConfig::default().with_record_count(0);
        assert!(matches!(zero.validate(), Err(DetectorError::InvalidConfiguration(_))));

        let mut contamination = DetectorConfig::default();
        contamination.isolation.contamination = 0.7;
        assert!(contamination.validate().is_err());

        let mut layers = DetectorConfig::default();
        layers.mlp.hidden_layer_sizes = vec![10, 0];
        assert!(layers.validate().is_err());

        let mut threshold = DetectorConfig::default();
        threshold.threshold = ThresholdConfig::new(f64::INFINITY);
        assert!(threshold.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = DetectorConfig::default().with_log_path("/tmp/anomalies.json");
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.log_path, config.log_path);
        assert_eq!(back.mlp.solver, config.mlp.solver);
    }
}
