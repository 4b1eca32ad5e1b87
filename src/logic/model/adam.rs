//! Adam optimizer over a flat parameter vector
//!
//! Standard Adam with bias correction:
//! m_t = β1 m + (1 - β1) g, v_t = β2 v + (1 - β2) g²,
//! θ_t = θ - lr * m̂ / (√v̂ + ε)

use ndarray::{Array1, Zip};

pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Array1<f64>,
    v: Array1<f64>,
}

impl Adam {
    pub fn new(lr: f64, beta1: f64, beta2: f64, epsilon: f64, n_params: usize) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Array1::zeros(n_params),
            v: Array1::zeros(n_params),
        }
    }

    /// Adam with default betas/epsilon
    pub fn default_params(lr: f64, n_params: usize) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, n_params)
    }

    pub fn step(&mut self, params: &mut Array1<f64>, grad: &Array1<f64>) {
        self.t = self.t.saturating_add(1);

        self.m = &self.m * self.beta1 + grad * (1.0 - self.beta1);
        self.v = &self.v * self.beta2 + &(grad * grad) * (1.0 - self.beta2);

        let lr_t = self.lr * (1.0 - self.beta2.powi(self.t)).sqrt()
            / (1.0 - self.beta1.powi(self.t));

        let eps = self.epsilon;
        Zip::from(params)
            .and(&self.m)
            .and(&self.v)
            .for_each(|p, &m, &v| *p -= lr_t * m / (v.sqrt() + eps));
    }
}
