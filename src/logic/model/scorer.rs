//! Binary Scorers
//!
//! One capability interface for both detectors: fit on features (and labels
//! when the scorer is supervised), then emit one boolean decision per row.
//! The combiner only ever sees these decision columns.

use ndarray::{Array1, Array2};

use super::isolation::{IsolationConfig, IsolationForest, OUTLIER};
use super::mlp::{MlpConfig, MlpRegressor};
use super::threshold::ThresholdConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::logic::features::StandardScaler;

// ============================================================================
// SCORER TRAIT
// ============================================================================

/// Trait cho các model phát hiện anomaly (unsupervised, supervised)
pub trait BinaryScorer {
    fn name(&self) -> &'static str;

    /// Whether `fit` consumes ground-truth labels
    fn uses_labels(&self) -> bool;

    fn fit(&mut self, features: &Array2<f64>, labels: Option<&Array1<f64>>) -> DetectorResult<()>;

    /// `true` = anomalous
    fn predict(&self, features: &Array2<f64>) -> DetectorResult<Vec<bool>>;

    fn is_fitted(&self) -> bool;
}

// ============================================================================
// ISOLATION FOREST SCORER
// ============================================================================

/// Partition-based outlier detector; never looks at labels
#[derive(Debug, Clone)]
pub struct IsolationScorer {
    forest: IsolationForest,
}

impl IsolationScorer {
    pub fn new(config: IsolationConfig) -> Self {
        Self {
            forest: IsolationForest::new(config),
        }
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }
}

impl BinaryScorer for IsolationScorer {
    fn name(&self) -> &'static str {
        "isolation_forest"
    }

    fn uses_labels(&self) -> bool {
        false
    }

    fn fit(&mut self, features: &Array2<f64>, _labels: Option<&Array1<f64>>) -> DetectorResult<()> {
        self.forest.fit(features)
    }

    fn predict(&self, features: &Array2<f64>) -> DetectorResult<Vec<bool>> {
        Ok(self
            .forest
            .predict(features)?
            .iter()
            .map(|&label| label == OUTLIER)
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.forest.is_fitted()
    }
}

// ============================================================================
// REGRESSION SCORER
// ============================================================================

/// MLP regressor on the attack label, cut at a fixed threshold
#[derive(Debug, Clone)]
pub struct RegressionScorer {
    mlp: MlpRegressor,
    threshold: ThresholdConfig,
}

impl RegressionScorer {
    pub fn new(config: MlpConfig, threshold: ThresholdConfig) -> Self {
        Self {
            mlp: MlpRegressor::new(config),
            threshold,
        }
    }

    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    pub fn regressor(&self) -> &MlpRegressor {
        &self.mlp
    }

    /// Raw regression scores, before the threshold
    pub fn scores(&self, features: &Array2<f64>) -> DetectorResult<Array1<f64>> {
        self.mlp.predict(features)
    }
}

impl BinaryScorer for RegressionScorer {
    fn name(&self) -> &'static str {
        "mlp_regressor"
    }

    fn uses_labels(&self) -> bool {
        true
    }

    fn fit(&mut self, features: &Array2<f64>, labels: Option<&Array1<f64>>) -> DetectorResult<()> {
        self.threshold.validate()?;
        let labels = labels
            .ok_or_else(|| DetectorError::invalid("regression scorer requires labels to fit"))?;
        self.mlp.fit(features, labels)
    }

    fn predict(&self, features: &Array2<f64>) -> DetectorResult<Vec<bool>> {
        Ok(self.threshold.apply(&self.scores(features)?))
    }

    fn is_fitted(&self) -> bool {
        self.mlp.is_fitted()
    }
}

// ============================================================================
// SCALING PIPELINE
// ============================================================================

/// Binds a scaler to a scorer so training and scoring see the same transform
#[derive(Debug, Clone)]
pub struct Scaled<S> {
    scaler: StandardScaler,
    inner: S,
}

impl<S: BinaryScorer> Scaled<S> {
    pub fn new(inner: S) -> Self {
        Self {
            scaler: StandardScaler::new(),
            inner,
        }
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: BinaryScorer> BinaryScorer for Scaled<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn uses_labels(&self) -> bool {
        self.inner.uses_labels()
    }

    fn fit(&mut self, features: &Array2<f64>, labels: Option<&Array1<f64>>) -> DetectorResult<()> {
        let scaled = self.scaler.fit_transform(features)?;
        self.inner.fit(&scaled, labels)
    }

    fn predict(&self, features: &Array2<f64>) -> DetectorResult<Vec<bool>> {
        let scaled = self.scaler.transform(features)?;
        self.inner.predict(&scaled)
    }

    fn is_fitted(&self) -> bool {
        self.scaler.is_fitted() && self.inner.is_fitted()
    }
}
