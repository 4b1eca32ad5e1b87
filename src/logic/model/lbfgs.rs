//! L-BFGS Solver
//!
//! Limited-memory quasi-Newton minimizer over a flat parameter vector.
//! Two-loop recursion for the search direction, backtracking line search
//! with the Armijo condition.

use std::collections::VecDeque;

use ndarray::Array1;

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct LbfgsOptions {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Maximum number of objective evaluations
    pub max_fun: usize,
    /// Number of correction pairs kept
    pub memory: usize,
    /// Stop when max |g_i| falls below this
    pub gtol: f64,
    /// Stop when relative loss reduction falls below this
    pub ftol: f64,
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            max_fun: 15000,
            memory: 10,
            gtol: 1e-4,
            ftol: 1e7 * f64::EPSILON,
        }
    }
}

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GradientTolerance,
    LossTolerance,
    MaxIterations,
    MaxEvaluations,
    LineSearchFailed,
}

#[derive(Debug, Clone)]
pub struct LbfgsReport {
    pub loss: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub reason: StopReason,
}

impl LbfgsReport {
    pub fn converged(&self) -> bool {
        matches!(
            self.reason,
            StopReason::GradientTolerance | StopReason::LossTolerance
        )
    }
}

// ============================================================================
// MINIMIZE
// ============================================================================

/// Minimize `objective`, which returns the loss and its gradient at `x`.
pub fn minimize<F>(
    mut objective: F,
    x0: Array1<f64>,
    options: &LbfgsOptions,
) -> (Array1<f64>, LbfgsReport)
where
    F: FnMut(&Array1<f64>) -> (f64, Array1<f64>),
{
    let mut x = x0;
    let (mut f, mut g) = objective(&x);
    let mut evaluations = 1;

    let mut history: VecDeque<(Array1<f64>, Array1<f64>, f64)> =
        VecDeque::with_capacity(options.memory);

    let mut iterations = 0;
    let reason = loop {
        if max_abs(&g) <= options.gtol {
            break StopReason::GradientTolerance;
        }
        if iterations >= options.max_iter {
            break StopReason::MaxIterations;
        }
        if evaluations >= options.max_fun {
            break StopReason::MaxEvaluations;
        }
        iterations += 1;

        let mut direction = search_direction(&g, &history);
        let mut slope = g.dot(&direction);
        if !(slope < 0.0) {
            // Not a descent direction: drop curvature info, fall back to steepest descent
            history.clear();
            direction = search_direction(&g, &history);
            slope = g.dot(&direction);
        }

        // Backtracking line search
        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let candidate = &x + &(&direction * step);
            let (f_new, g_new) = objective(&candidate);
            evaluations += 1;

            if f_new.is_finite() && f_new <= f + ARMIJO_C1 * step * slope {
                accepted = Some((candidate, f_new, g_new));
                break;
            }
            if evaluations >= options.max_fun {
                break;
            }
            step *= 0.5;
        }

        let Some((x_new, f_new, g_new)) = accepted else {
            break if evaluations >= options.max_fun {
                StopReason::MaxEvaluations
            } else {
                StopReason::LineSearchFailed
            };
        };

        let s = &x_new - &x;
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if sy > f64::EPSILON * y.dot(&y) {
            if history.len() == options.memory {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        let reduction = (f - f_new) / f.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        f = f_new;
        g = g_new;

        if reduction <= options.ftol {
            break StopReason::LossTolerance;
        }
    };

    let report = LbfgsReport {
        loss: f,
        iterations,
        evaluations,
        reason,
    };
    (x, report)
}

/// Two-loop recursion: approximates `-H * g`
fn search_direction(
    g: &Array1<f64>,
    history: &VecDeque<(Array1<f64>, Array1<f64>, f64)>,
) -> Array1<f64> {
    let Some((s_last, y_last, _)) = history.back() else {
        let norm = g.dot(g).sqrt();
        return g * (-1.0 / norm.max(1.0));
    };

    let mut q = g.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * s.dot(&q);
        q.scaled_add(-alpha, y);
        alphas.push(alpha);
    }

    let gamma = s_last.dot(y_last) / y_last.dot(y_last);
    let mut r = q * gamma;
    for ((s, y, rho), alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = rho * y.dot(&r);
        r.scaled_add(alpha - beta, s);
    }

    -r
}

fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0f64, |acc, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_quadratic_minimum() {
        // f(x) = (x0 - 3)^2 + 10 (x1 + 1)^2
        let objective = |x: &Array1<f64>| {
            let f = (x[0] - 3.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2);
            let g = array![2.0 * (x[0] - 3.0), 20.0 * (x[1] + 1.0)];
            (f, g)
        };

        let (x, report) = minimize(objective, array![0.0, 0.0], &LbfgsOptions::default());
        assert!(report.converged(), "stopped with {:?}", report.reason);
        assert!((x[0] - 3.0).abs() < 1e-3);
        assert!((x[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rosenbrock() {
        let objective = |x: &Array1<f64>| {
            let (a, b) = (x[0], x[1]);
            let f = (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2);
            let g = array![
                -2.0 * (1.0 - a) - 400.0 * a * (b - a * a),
                200.0 * (b - a * a)
            ];
            (f, g)
        };

        let options = LbfgsOptions {
            gtol: 1e-8,
            ftol: 0.0,
            ..Default::default()
        };
        let (x, report) = minimize(objective, array![-1.2, 1.0], &options);
        assert!(report.loss < 1e-6, "loss {} after {:?}", report.loss, report.reason);
        assert!((x[0] - 1.0).abs() < 1e-2);
        assert!((x[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_iteration_cap() {
        let objective = |x: &Array1<f64>| (x[0] * x[0], array![2.0 * x[0]]);
        let options = LbfgsOptions {
            max_iter: 0,
            ..Default::default()
        };
        let (x, report) = minimize(objective, array![5.0], &options);
        assert_eq!(report.reason, StopReason::MaxIterations);
        assert_eq!(x[0], 5.0);
    }
}
