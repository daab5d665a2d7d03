//! Logistic calibration of per-descriptor log-odds
//!
//! Fits an L2-regularized binary logistic regression on the log-odds
//! matrix with damped Newton iterations. The objective is
//!
//! ```text
//! sum_i [ softplus(z_i) - y_i * z_i ] + |w|^2 / (2C),   z_i = w . x_i + b
//! ```
//!
//! The intercept is not penalized. The objective is strictly convex in
//! `w`, so the fit converges to the unique regularized optimum even when
//! the classes are linearly separable.

use crate::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Curvature added to the intercept's diagonal to keep the Newton system
/// solvable when every prediction saturates.
const INTERCEPT_DAMPING: f64 = 1e-10;

/// Armijo sufficient-decrease constant for the line search
const ARMIJO: f64 = 1e-4;

/// Maximum number of step halvings per Newton iteration
const MAX_HALVINGS: usize = 40;

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Fitted parameters of the logistic combiner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationWeights {
    /// One weight per descriptor
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl CalibrationWeights {
    /// Linear score `w . x + b`
    pub fn decision(&self, log_odds: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(log_odds)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }

    /// Probability of the positive class
    pub fn predict(&self, log_odds: &[f64]) -> f64 {
        sigmoid(self.decision(log_odds)).clamp(0.0, 1.0)
    }

    pub fn validate(&self, descriptors: usize) -> Result<(), String> {
        if self.weights.len() != descriptors {
            return Err(format!(
                "{} calibration weights for {} descriptors",
                self.weights.len(),
                descriptors
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("calibration weights are not finite".to_string());
        }
        Ok(())
    }
}

/// Outcome of a calibration fit
#[derive(Debug, Clone)]
pub struct CalibrationFit {
    pub weights: CalibrationWeights,
    pub iterations: usize,
    pub converged: bool,
}

/// L2-regularized logistic regression solver
#[derive(Debug, Clone)]
pub struct Calibrator {
    regularization_c: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl Calibrator {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            regularization_c: config.regularization_c,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }

    /// Fit weights mapping rows of `log_odds` to `labels` (0.0 or 1.0).
    ///
    /// Inputs must be non-empty and rectangular.
    pub fn fit(&self, log_odds: &[Vec<f64>], labels: &[f64]) -> CalibrationFit {
        let dims = log_odds.first().map_or(0, |row| row.len());
        let n = log_odds.len();
        // Parameters: weights followed by the intercept
        let mut theta = vec![0.0; dims + 1];
        let mut current = self.objective(log_odds, labels, &theta);
        let threshold = self.tolerance * (n.max(1) as f64);

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let (gradient, hessian) = self.gradient_hessian(log_odds, labels, &theta);
            let grad_norm = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if grad_norm <= threshold {
                converged = true;
                break;
            }
            iterations += 1;

            let direction = solve_linear_system(hessian, gradient.clone()).unwrap_or_else(|| {
                debug!("singular Newton system, falling back to gradient step");
                gradient.clone()
            });
            let slope: f64 = gradient.iter().zip(&direction).map(|(g, d)| g * d).sum();

            let mut step = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_HALVINGS {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&direction)
                    .map(|(t, d)| t - step * d)
                    .collect();
                let value = self.objective(log_odds, labels, &candidate);
                if value <= current - ARMIJO * step * slope {
                    accepted = Some((candidate, value));
                    break;
                }
                step *= 0.5;
            }

            match accepted {
                Some((candidate, value)) => {
                    let improvement = current - value;
                    theta = candidate;
                    current = value;
                    if improvement <= f64::EPSILON * current.abs().max(1.0) {
                        converged = true;
                        break;
                    }
                }
                None => {
                    // No representable decrease left along the Newton direction
                    converged = true;
                    break;
                }
            }
        }

        if !converged {
            warn!(
                "calibration did not converge within {} iterations",
                self.max_iterations
            );
        }

        let bias = theta.pop().unwrap_or(0.0);
        CalibrationFit {
            weights: CalibrationWeights {
                weights: theta,
                bias,
            },
            iterations,
            converged,
        }
    }

    fn objective(&self, x: &[Vec<f64>], y: &[f64], theta: &[f64]) -> f64 {
        let dims = theta.len() - 1;
        let loss: f64 = x
            .iter()
            .zip(y)
            .map(|(row, &label)| {
                let z = linear(row, theta);
                softplus(z) - label * z
            })
            .sum();
        let penalty: f64 = theta[..dims].iter().map(|w| w * w).sum::<f64>() / (2.0 * self.regularization_c);
        loss + penalty
    }

    fn gradient_hessian(&self, x: &[Vec<f64>], y: &[f64], theta: &[f64]) -> (Vec<f64>, Vec<Vec<f64>>) {
        let size = theta.len();
        let dims = size - 1;
        let mut gradient = vec![0.0; size];
        let mut hessian = vec![vec![0.0; size]; size];

        for (row, &label) in x.iter().zip(y) {
            let p = sigmoid(linear(row, theta));
            let residual = p - label;
            let curvature = p * (1.0 - p);

            for a in 0..size {
                let xa = if a < dims { row[a] } else { 1.0 };
                gradient[a] += residual * xa;
                for b in 0..=a {
                    let xb = if b < dims { row[b] } else { 1.0 };
                    hessian[a][b] += curvature * xa * xb;
                }
            }
        }

        for a in 0..size {
            for b in 0..a {
                hessian[b][a] = hessian[a][b];
            }
        }
        for j in 0..dims {
            gradient[j] += theta[j] / self.regularization_c;
            hessian[j][j] += 1.0 / self.regularization_c;
        }
        hessian[dims][dims] += INTERCEPT_DAMPING;

        (gradient, hessian)
    }
}

fn linear(row: &[f64], theta: &[f64]) -> f64 {
    let dims = theta.len() - 1;
    row.iter().zip(&theta[..dims]).map(|(x, w)| x * w).sum::<f64>() + theta[dims]
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the matrix is numerically singular.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 || !a[pivot][col].is_finite() {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
