//! Isolation Forest
//!
//! Ensemble of random partitioning trees. Outliers are isolated in fewer
//! splits, so a short average path length means a high anomaly score.
//! Không dùng label khi train.

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{seq::index, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONTAMINATION, DEFAULT_SEED};
use crate::error::{DetectorError, DetectorResult};

// ============================================================================
// CONSTANTS
// ============================================================================

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Raw label for an outlier
pub const OUTLIER: i32 = -1;
/// Raw label for an inlier
pub const INLIER: i32 = 1;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationConfig {
    pub n_estimators: usize,
    /// Subsample size per tree, capped at the number of rows
    pub max_samples: usize,
    /// Expected outlier fraction, sets the decision offset
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
        }
    }
}

impl IsolationConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.n_estimators == 0 || self.max_samples == 0 {
            return Err(DetectorError::invalid(
                "n_estimators and max_samples must be positive",
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(DetectorError::invalid(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(x: &Array2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, rows, 0, max_depth, rng);
        tree
    }

    /// Append the subtree for `rows` and return its node index
    fn grow(
        &mut self,
        x: &Array2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if rows.len() <= 1 || depth >= max_depth {
            return id;
        }

        let feature = rng.gen_range(0..x.ncols());
        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            let v = x[[r, feature]];
            (lo.min(v), hi.max(v))
        });
        if !(max > min) {
            return id;
        }

        let threshold = rng.gen_range(min..max);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| x[[r, feature]] < threshold);

        let left = self.grow(x, left_rows, depth + 1, max_depth, rng);
        let right = self.grow(x, right_rows, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth reached by `sample` plus the expected depth of its leaf
    pub fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[feature] < threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// c(n): average path length of an unsuccessful BST search over n points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: IsolationConfig,
    trees: Vec<IsolationTree>,
    subsample: usize,
    offset: f64,
    n_features: usize,
}

impl IsolationForest {
    pub fn new(config: IsolationConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            subsample: 0,
            offset: 0.0,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &IsolationConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Score cut below which a sample is an outlier
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Build a fresh ensemble, replacing any previous one
    pub fn fit(&mut self, x: &Array2<f64>) -> DetectorResult<()> {
        self.config.validate()?;
        let n = x.nrows();
        if n == 0 || x.ncols() == 0 {
            return Err(DetectorError::invalid("cannot fit isolation forest on an empty matrix"));
        }

        let subsample = self.config.max_samples.min(n);
        let max_depth = (subsample.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.trees = (0..self.config.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n, subsample).into_vec();
                IsolationTree::build(x, rows, max_depth, &mut rng)
            })
            .collect();
        self.subsample = subsample;
        self.n_features = x.ncols();

        let scores = self.score_samples(x)?;
        self.offset = percentile(&scores, 100.0 * self.config.contamination);

        log::info!(
            "Isolation forest fitted: {} trees, subsample={}, depth<={}, offset={:.4}",
            self.trees.len(),
            subsample,
            max_depth,
            self.offset
        );
        Ok(())
    }

    /// Opposite of the anomaly score: lower is more abnormal, range [-1, 0)
    pub fn score_samples(&self, x: &Array2<f64>) -> DetectorResult<Array1<f64>> {
        if !self.is_fitted() {
            return Err(DetectorError::unfitted("IsolationForest"));
        }
        if x.ncols() != self.n_features {
            return Err(DetectorError::invalid(format!(
                "isolation forest trained on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let norm = average_path_length(self.subsample).max(f64::MIN_POSITIVE);
        let n_trees = self.trees.len() as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let mean_depth =
                    self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / n_trees;
                -(2f64.powf(-mean_depth / norm))
            })
            .collect())
    }

    /// Negative for outliers
    pub fn decision_function(&self, x: &Array2<f64>) -> DetectorResult<Array1<f64>> {
        Ok(self.score_samples(x)? - self.offset)
    }

    /// `OUTLIER` (-1) or `INLIER` (1) per row
    pub fn predict(&self, x: &Array2<f64>) -> DetectorResult<Array1<i32>> {
        Ok(self
            .decision_function(x)?
            .mapv(|d| if d < 0.0 { OUTLIER } else { INLIER }))
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &Array1<f64>, q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
