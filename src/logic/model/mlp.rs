//! MLP Regressor
//!
//! Feed-forward network (ReLU hidden layers, identity output) trained with
//! squared-error loss plus L2 penalty. Outputs are unbounded regression
//! scores, not probabilities.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::adam::Adam;
use super::lbfgs::{self, LbfgsOptions};
use crate::constants::DEFAULT_SEED;
use crate::error::{DetectorError, DetectorResult};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// Quasi-Newton, full batch
    Lbfgs,
    /// Mini-batch first-order, uses `learning_rate_init`
    Adam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden_layer_sizes: Vec<usize>,
    pub solver: Solver,
    pub learning_rate_init: f64,
    pub max_iter: usize,
    /// L2 penalty
    pub alpha: f64,
    pub tol: f64,
    /// L-BFGS only
    pub max_fun: usize,
    /// Adam only
    pub batch_size: usize,
    /// Adam only: epochs without `tol` improvement before stopping
    pub n_iter_no_change: usize,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![10, 5],
            solver: Solver::Lbfgs,
            learning_rate_init: 0.001,
            max_iter: 1000,
            alpha: 1e-4,
            tol: 1e-4,
            max_fun: 15000,
            batch_size: 200,
            n_iter_no_change: 10,
            seed: DEFAULT_SEED,
        }
    }
}

impl MlpConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.hidden_layer_sizes.is_empty() || self.hidden_layer_sizes.contains(&0) {
            return Err(DetectorError::invalid(format!(
                "hidden_layer_sizes must be non-empty and positive, got {:?}",
                self.hidden_layer_sizes
            )));
        }
        if self.max_iter == 0 || self.max_fun == 0 {
            return Err(DetectorError::invalid("max_iter and max_fun must be positive"));
        }
        if !(self.learning_rate_init > 0.0 && self.learning_rate_init.is_finite()) {
            return Err(DetectorError::invalid(format!(
                "learning_rate_init must be positive, got {}",
                self.learning_rate_init
            )));
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) || !(self.tol >= 0.0) {
            return Err(DetectorError::invalid("alpha and tol must be non-negative"));
        }
        if self.batch_size == 0 {
            return Err(DetectorError::invalid("batch_size must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// NETWORK
// ============================================================================

#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct MlpRegressor {
    config: MlpConfig,
    layers: Vec<Layer>,
    n_features: usize,
    loss: Option<f64>,
    n_iter: usize,
}

impl MlpRegressor {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            layers: Vec::new(),
            n_features: 0,
            loss: None,
            n_iter: 0,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Final training loss
    pub fn loss(&self) -> Option<f64> {
        self.loss
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> DetectorResult<()> {
        self.config.validate()?;
        if x.nrows() == 0 {
            return Err(DetectorError::invalid("cannot fit MLP on an empty matrix"));
        }
        if x.nrows() != y.len() {
            return Err(DetectorError::invalid(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sizes = vec![x.ncols()];
        sizes.extend(&self.config.hidden_layer_sizes);
        sizes.push(1);
        let initial = init_layers(&sizes, &mut rng);

        let (layers, loss, n_iter) = match self.config.solver {
            Solver::Lbfgs => self.fit_lbfgs(initial, x, y),
            Solver::Adam => self.fit_adam(initial, x, y, &mut rng),
        };

        log::info!(
            "MLP trained ({:?}, layers {:?}): loss={:.6}, iterations={}",
            self.config.solver,
            sizes,
            loss,
            n_iter
        );

        self.layers = layers;
        self.n_features = x.ncols();
        self.loss = Some(loss);
        self.n_iter = n_iter;
        Ok(())
    }

    /// Continuous regression score per row
    pub fn predict(&self, x: &Array2<f64>) -> DetectorResult<Array1<f64>> {
        if !self.is_fitted() {
            return Err(DetectorError::unfitted("MlpRegressor"));
        }
        if x.ncols() != self.n_features {
            return Err(DetectorError::invalid(format!(
                "MLP trained on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let mut activations = forward(&self.layers, x);
        let output = activations.pop().unwrap_or_else(|| x.to_owned());
        Ok(output.column(0).to_owned())
    }

    fn fit_lbfgs(
        &self,
        initial: Vec<Layer>,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Vec<Layer>, f64, usize) {
        let shapes: Vec<(usize, usize)> = initial.iter().map(|l| l.weights.dim()).collect();
        let alpha = self.config.alpha;
        let options = LbfgsOptions {
            max_iter: self.config.max_iter,
            max_fun: self.config.max_fun,
            gtol: self.config.tol,
            ..Default::default()
        };

        let objective = |theta: &Array1<f64>| {
            let layers = unpack(theta, &shapes);
            let (loss, grads) = loss_and_gradients(&layers, x, y, alpha);
            (loss, pack(&grads))
        };

        let (theta, report) = lbfgs::minimize(objective, pack(&initial), &options);
        if report.converged() {
            log::debug!(
                "L-BFGS converged ({:?}) after {} iterations, {} evaluations",
                report.reason,
                report.iterations,
                report.evaluations
            );
        } else {
            log::warn!(
                "L-BFGS stopped without converging ({:?}) after {} iterations",
                report.reason,
                report.iterations
            );
        }

        (unpack(&theta, &shapes), report.loss, report.iterations)
    }

    fn fit_adam(
        &self,
        initial: Vec<Layer>,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut StdRng,
    ) -> (Vec<Layer>, f64, usize) {
        let shapes: Vec<(usize, usize)> = initial.iter().map(|l| l.weights.dim()).collect();
        let n = x.nrows();
        let batch_size = self.config.batch_size.min(n);

        let mut theta = pack(&initial);
        let mut adam = Adam::default_params(self.config.learning_rate_init, theta.len());
        let mut indices: Vec<usize> = (0..n).collect();

        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0;
        let mut epoch_loss = f64::INFINITY;
        let mut epochs = 0;

        while epochs < self.config.max_iter {
            epochs += 1;
            indices.shuffle(rng);

            let mut accumulated = 0.0;
            for batch in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = y.select(Axis(0), batch);
                let layers = unpack(&theta, &shapes);
                let (loss, grads) = loss_and_gradients(&layers, &xb, &yb, self.config.alpha);
                adam.step(&mut theta, &pack(&grads));
                accumulated += loss * batch.len() as f64;
            }
            epoch_loss = accumulated / n as f64;

            if !epoch_loss.is_finite() {
                log::warn!("Adam diverged at epoch {}", epochs);
                break;
            }
            if epoch_loss > best_loss - self.config.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);

            if no_improvement > self.config.n_iter_no_change {
                log::debug!("Adam stopped: no improvement for {} epochs", no_improvement);
                break;
            }
        }

        if epochs == self.config.max_iter {
            log::warn!("Adam reached max_iter={} without converging", epochs);
        }

        (unpack(&theta, &shapes), epoch_loss, epochs)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Glorot-uniform init for weights and biases
fn init_layers(sizes: &[usize], rng: &mut StdRng) -> Vec<Layer> {
    sizes
        .windows(2)
        .map(|w| {
            let (fan_in, fan_out) = (w[0], w[1]);
            let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
            let weights =
                Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-bound..bound));
            let bias = Array1::from_shape_fn(fan_out, |_| rng.gen_range(-bound..bound));
            Layer { weights, bias }
        })
        .collect()
}

/// Activations of every layer, input first
fn forward(layers: &[Layer], x: &Array2<f64>) -> Vec<Array2<f64>> {
    let mut activations = Vec::with_capacity(layers.len() + 1);
    activations.push(x.to_owned());

    for (i, layer) in layers.iter().enumerate() {
        let z = activations[i].dot(&layer.weights) + &layer.bias;
        let a = if i + 1 < layers.len() {
            z.mapv_into(|v| v.max(0.0))
        } else {
            z
        };
        activations.push(a);
    }
    activations
}

/// Loss `Σ(ŷ - y)² / 2n + α Σ‖W‖² / 2n` and its gradient per layer
fn loss_and_gradients(
    layers: &[Layer],
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
) -> (f64, Vec<Layer>) {
    let n = x.nrows() as f64;
    let activations = forward(layers, x);
    let output = &activations[layers.len()];

    let targets = y.view().insert_axis(Axis(1));
    let residual = output - &targets;
    let penalty: f64 = layers.iter().map(|l| l.weights.iter().map(|w| w * w).sum::<f64>()).sum();
    let loss = residual.iter().map(|r| r * r).sum::<f64>() / (2.0 * n) + alpha * penalty / (2.0 * n);

    let mut delta = residual / n;
    let mut grads: Vec<Layer> = Vec::with_capacity(layers.len());

    for i in (0..layers.len()).rev() {
        let weights = activations[i].t().dot(&delta) + &(&layers[i].weights * (alpha / n));
        let bias = delta.sum_axis(Axis(0));

        if i > 0 {
            let relu_grad = activations[i].mapv(|a| if a > 0.0 { 1.0 } else { 0.0 });
            delta = delta.dot(&layers[i].weights.t()) * &relu_grad;
        }
        grads.push(Layer { weights, bias });
    }

    grads.reverse();
    (loss, grads)
}

fn pack(layers: &[Layer]) -> Array1<f64> {
    layers
        .iter()
        .flat_map(|l| l.weights.iter().chain(l.bias.iter()).copied())
        .collect()
}

fn unpack(theta: &Array1<f64>, shapes: &[(usize, usize)]) -> Vec<Layer> {
    let mut offset = 0;
    shapes
        .iter()
        .map(|&(rows, cols)| {
            let weights = Array2::from_shape_fn((rows, cols), |(r, c)| theta[offset + r * cols + c]);
            offset += rows * cols;
            let bias = Array1::from_shape_fn(cols, |c| theta[offset + c]);
            offset += cols;
            Layer { weights, bias }
        })
        .collect()
}
