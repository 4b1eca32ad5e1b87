//! Detection Engine
//!
//! Owns the synthetic dataset, both trained scorers and the anomaly log.
//!
//! States: `Uninitialized -> Trained -> Scoring -> Logged`, then
//! `Logged -> Scoring` for every further pass. Models are fitted once;
//! a pass only re-scores and overwrites the decision fields.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::error::{DetectorError, DetectorResult};
use crate::logic::config::DetectorConfig;
use crate::logic::dataset::{Dataset, TrafficGenerator, TrafficRecord};
use crate::logic::features::scaler::ScalerParams;
use crate::logic::features::StandardScaler;
use crate::logic::model::{BinaryScorer, IsolationScorer, RegressionScorer, Scaled};
use crate::logic::report::DetectionSummary;
use crate::logic::telemetry::AnomalyLogWriter;
use crate::logic::threat::combine_columns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Uninitialized,
    Trained,
    Scoring,
    Logged,
}

/// Snapshot for status displays
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub record_count: usize,
    pub attack_count: usize,
    pub scaler: Option<ScalerParams>,
    pub isolation_fitted: bool,
    pub mlp_fitted: bool,
    pub passes: u64,
    pub lines_written: u64,
    pub log_path: String,
}

pub struct AnomalyDetector {
    config: DetectorConfig,
    dataset: Dataset,
    unsupervised: IsolationScorer,
    supervised: Scaled<RegressionScorer>,
    log: AnomalyLogWriter,
    state: EngineState,
    passes: u64,
}

impl AnomalyDetector {
    /// Generate the dataset and fit both scorers
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        let mut detector = Self::untrained(config)?;
        detector.train()?;
        Ok(detector)
    }

    /// Default configuration with a custom normal-record count
    pub fn with_record_count(record_count: usize) -> DetectorResult<Self> {
        Self::new(DetectorConfig::default().with_record_count(record_count))
    }

    /// Generate the dataset only; `train` must run before detection
    pub fn untrained(config: DetectorConfig) -> DetectorResult<Self> {
        Self::untrained_at(config, Utc::now())
    }

    /// Like `untrained`, with the attack-timestamp anchor pinned
    pub fn untrained_at(config: DetectorConfig, now: DateTime<Utc>) -> DetectorResult<Self> {
        config.validate()?;

        let dataset = TrafficGenerator::new(config.generator.clone())?.generate(now)?;

        Ok(Self {
            unsupervised: IsolationScorer::new(config.isolation.clone()),
            supervised: Scaled::new(RegressionScorer::new(config.mlp.clone(), config.threshold)),
            log: AnomalyLogWriter::new(config.log_path.clone()),
            dataset,
            config,
            state: EngineState::Uninitialized,
            passes: 0,
        })
    }

    /// Fit the scaler and both scorers. Trained state is immutable, so a
    /// second call is rejected.
    pub fn train(&mut self) -> DetectorResult<()> {
        if self.state != EngineState::Uninitialized {
            return Err(DetectorError::invalid("models are already trained"));
        }

        let features = self.dataset.feature_matrix();
        let labels = self.dataset.labels();
        fit_scorer(&mut self.unsupervised, &features, &labels)?;
        fit_scorer(&mut self.supervised, &features, &labels)?;

        self.state = EngineState::Trained;
        Ok(())
    }

    /// Re-score every record, update decisions in place and append the
    /// flagged subset to the anomaly log.
    ///
    /// On a log failure the decisions are kept, the state returns to where
    /// the pass started and the flagged subset is carried by
    /// `DetectorError::LogWrite`.
    pub fn run_detection(&mut self) -> DetectorResult<Vec<TrafficRecord>> {
        if !self.is_trained() {
            return Err(DetectorError::ModelsNotTrained);
        }

        let previous = self.state;
        self.state = EngineState::Scoring;
        if let Err(e) = self.score() {
            self.state = previous;
            return Err(e);
        }
        self.passes += 1;

        let anomalies = self.dataset.anomalies();
        log::info!(
            "Pass {}: {} of {} records flagged",
            self.passes,
            anomalies.len(),
            self.dataset.len()
        );

        match self.log.append(&anomalies) {
            Ok(_) => {
                self.state = EngineState::Logged;
                Ok(anomalies)
            }
            Err(source) => {
                // Scored but not logged: fall back to the resting state the pass started from
                self.state = previous;
                log::error!("Failed to append anomalies to {:?}: {}", self.log.path(), source);
                Err(DetectorError::LogWrite {
                    path: self.log.path().to_path_buf(),
                    source,
                    anomalies,
                })
            }
        }
    }

    fn score(&mut self) -> DetectorResult<()> {
        let features = self.dataset.feature_matrix();
        let by_isolation = self.unsupervised.predict(&features)?;
        let by_mlp = self.supervised.predict(&features)?;
        let decisions = combine_columns(&by_isolation, &by_mlp)?;
        self.dataset.apply_decisions(&decisions)
    }

    pub fn is_trained(&self) -> bool {
        self.state != EngineState::Uninitialized
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Scaler fitted for the regression scorer
    pub fn scaler(&self) -> &StandardScaler {
        self.supervised.scaler()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn summary(&self) -> DetectionSummary {
        DetectionSummary::from_records(self.dataset.records())
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            record_count: self.dataset.len(),
            attack_count: self.dataset.attack_count(),
            scaler: self.scaler().params().ok().cloned(),
            isolation_fitted: self.unsupervised.is_fitted(),
            mlp_fitted: self.supervised.is_fitted(),
            passes: self.passes,
            lines_written: self.log.lines_written(),
            log_path: self.log.path().display().to_string(),
        }
    }
}

/// Labels only reach scorers that ask for them
fn fit_scorer<S: BinaryScorer>(
    scorer: &mut S,
    features: &Array2<f64>,
    labels: &Array1<f64>,
) -> DetectorResult<()> {
    let labels = scorer.uses_labels().then_some(labels);
    scorer.fit(features, labels)?;
    log::info!("Trained {} on {} records", scorer.name(), features.nrows());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::telemetry::read_records;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, record_count: usize) -> DetectorConfig {
        DetectorConfig::default()
            .with_record_count(record_count)
            .with_log_path(dir.path().join("mock_anomaly_logs.json"))
    }

    #[test]
    fn test_default_scenario() {
        let dir = TempDir::new().unwrap();
        let mut detector = AnomalyDetector::new(config_in(&dir, 1000)).unwrap();
        assert_eq!(detector.state(), EngineState::Trained);
        assert_eq!(detector.dataset().len(), 1050);
        assert_eq!(detector.dataset().attack_count(), 50);

        let anomalies = detector.run_detection().unwrap();
        assert!(anomalies.len() >= 50, "only {} flagged", anomalies.len());
        assert!(anomalies.iter().all(|r| r.is_anomaly()));
        assert_eq!(detector.state(), EngineState::Logged);

        let summary = detector.summary();
        assert_eq!(summary.flagged, anomalies.len());
        assert_eq!(summary.missed_attacks, 0);
    }

    #[test]
    fn test_combined_flag_matches_model_flags() {
        let dir = TempDir::new().unwrap();
        let mut detector = AnomalyDetector::new(config_in(&dir, 300)).unwrap();
        detector.run_detection().unwrap();

        for record in detector.dataset().records() {
            let d = record.decisions.unwrap();
            assert_eq!(d.anomaly(), d.anomaly_if().max(d.anomaly_mlp()));
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let mut a = AnomalyDetector::new(config_in(&dir, 400)).unwrap();
        let mut b = AnomalyDetector::new(config_in(&dir, 400)).unwrap();
        a.run_detection().unwrap();
        b.run_detection().unwrap();

        let column = |d: &AnomalyDetector| -> Vec<bool> {
            d.dataset()
                .records()
                .iter()
                .map(|r| r.decisions.unwrap().anomaly_if())
                .collect()
        };
        assert_eq!(column(&a), column(&b));
        assert_eq!(a.scaler().params().unwrap(), b.scaler().params().unwrap());
    }

    #[test]
    fn test_zero_record_count_rejected() {
        let dir = TempDir::new().unwrap();
        let result = AnomalyDetector::new(config_in(&dir, 0));
        assert!(matches!(result, Err(DetectorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_untrained_engine_refuses_detection() {
        let dir = TempDir::new().unwrap();
        let mut detector = AnomalyDetector::untrained(config_in(&dir, 100)).unwrap();
        assert_eq!(detector.state(), EngineState::Uninitialized);

        let result = detector.run_detection();
        assert!(matches!(result, Err(DetectorError::ModelsNotTrained)));
        assert!(detector.dataset().records().iter().all(|r| r.decisions.is_none()));
        assert!(!dir.path().join("mock_anomaly_logs.json").exists());

        detector.train().unwrap();
        assert!(detector.run_detection().is_ok());
    }

    #[test]
    fn test_train_twice_rejected() {
        let dir = TempDir::new().unwrap();
        let mut detector = AnomalyDetector::new(config_in(&dir, 100)).unwrap();
        let before = detector.scaler().params().unwrap().clone();

        assert!(matches!(detector.train(), Err(DetectorError::InvalidConfiguration(_))));
        assert_eq!(detector.scaler().params().unwrap(), &before);
    }

    #[test]
    fn test_two_passes_append_twice() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 500);
        let log_path = config.log_path.clone();
        let mut detector = AnomalyDetector::new(config).unwrap();

        let first = detector.run_detection().unwrap();
        let second = detector.run_detection().unwrap();
        assert_eq!(first, second);

        let logged = read_records(&log_path).unwrap();
        assert_eq!(logged.len(), first.len() * 2);
        assert!(logged.iter().all(|r| r.is_anomaly()));

        let status = detector.status();
        assert_eq!(status.passes, 2);
        assert_eq!(status.lines_written, logged.len() as u64);
    }

    #[test]
    fn test_log_failure_keeps_result() {
        let dir = TempDir::new().unwrap();
        // The log path is a directory, so opening it for append fails
        let config = config_in(&dir, 200).with_log_path(dir.path());
        let mut detector = AnomalyDetector::new(config).unwrap();

        let err = detector.run_detection().unwrap_err();
        assert!(matches!(err, DetectorError::LogWrite { .. }));
        let anomalies = err.into_anomalies().unwrap();
        assert!(!anomalies.is_empty());
        assert_eq!(anomalies, detector.dataset().anomalies());
        assert!(detector.dataset().records().iter().all(|r| r.decisions.is_some()));

        // Back at rest, never parked in the transient scoring state
        assert_eq!(detector.state(), EngineState::Trained);
        assert_eq!(detector.status().state, EngineState::Trained);
        assert_eq!(detector.status().lines_written, 0);

        assert!(detector.run_detection().is_err());
        assert_eq!(detector.state(), EngineState::Trained);
        assert_eq!(detector.passes(), 2);
    }

    #[test]
    fn test_status_snapshot() {
        let dir = TempDir::new().unwrap();
        let detector = AnomalyDetector::new(config_in(&dir, 100)).unwrap();
        let status = detector.status();

        assert_eq!(status.state, EngineState::Trained);
        assert_eq!(status.record_count, 150);
        assert_eq!(status.attack_count, 50);
        assert!(status.isolation_fitted && status.mlp_fitted);
        assert!(status.scaler.is_some());
        assert_eq!(status.lines_written, 0);
    }
}
