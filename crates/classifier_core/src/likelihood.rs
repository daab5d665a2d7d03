//! Nonparametric per-descriptor likelihood estimation
//!
//! Each descriptor column is binned independently at equal rank-quantiles
//! of its training values. The fraction of positive labels in each bin is
//! smoothed along the bin axis and read back as log-odds.
//!
//! Lookup clamps a value into the training range before locating its bin,
//! so any input, however far outside the range, maps to a finite log-odds.

use crate::config::ClassifierConfig;
use crate::features::column;
use crate::smoothing::gaussian_smooth;
use serde::{Deserialize, Serialize};

/// `ln(p + eps) - ln(1 - p + eps)`
pub fn log_odds(p: f64, epsilon: f64) -> f64 {
    (p + epsilon).ln() - (1.0 - p + epsilon).ln()
}

/// Binning grid and smoothed positive rate for a single descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorLikelihood {
    /// Non-decreasing bin edges sampled from the sorted training column
    pub grid: Vec<f64>,
    /// Smoothed positive rate per bin (`grid.len() - 1` entries)
    pub rates: Vec<f64>,
}

impl DescriptorLikelihood {
    /// Fit grid and bin rates for one descriptor column.
    ///
    /// Assumes `values.len() == labels.len() >= 1`. When there are fewer
    /// objects than requested nodes the grid shrinks to one node per object
    /// so that no bin is empty.
    pub fn fit(values: &[f64], labels: &[f64], config: &ClassifierConfig) -> Self {
        let n = values.len();
        let nodes = config.nodes.min(n).max(2);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        // Rank positions evenly spaced over 0..=n-1, truncated to integers.
        let last = n.saturating_sub(1);
        let ranks: Vec<usize> = (0..nodes).map(|j| j * last / (nodes - 1)).collect();

        let grid: Vec<f64> = ranks.iter().map(|&r| values[order[r]]).collect();

        let prior = labels.iter().sum::<f64>() / n.max(1) as f64;
        let raw: Vec<f64> = ranks
            .windows(2)
            .map(|edge| {
                let members = &order[edge[0]..edge[1]];
                if members.is_empty() {
                    prior
                } else {
                    members.iter().map(|&i| labels[i]).sum::<f64>() / members.len() as f64
                }
            })
            .collect();

        let rates = gaussian_smooth(&raw, config.smoothing_sigma, config.smoothing_truncate)
            .into_iter()
            .map(|p| p.clamp(0.0, 1.0))
            .collect();

        Self { grid, rates }
    }

    /// Bin index of `value` after clamping it into the grid range.
    ///
    /// A value equal to a grid edge joins the bin whose right edge it is;
    /// the minimum training value maps to bin 0. NaN maps to bin 0.
    pub fn bin_index(&self, value: f64) -> usize {
        let lo = self.grid[0];
        let hi = self.grid[self.grid.len() - 1];
        let clamped = value.max(lo).min(hi);

        let right_edge = self.grid.partition_point(|&edge| edge < clamped);
        right_edge.saturating_sub(1).min(self.rates.len() - 1)
    }

    /// Log-odds of the bin containing `value`
    pub fn lookup(&self, value: f64, epsilon: f64) -> f64 {
        log_odds(self.rates[self.bin_index(value)], epsilon)
    }

    /// Structural checks used when a persisted model is read back
    pub fn validate(&self) -> Result<(), String> {
        if self.grid.len() < 2 {
            return Err(format!("grid has {} nodes, need at least 2", self.grid.len()));
        }
        if self.rates.len() != self.grid.len() - 1 {
            return Err(format!(
                "{} bin rates for {} grid nodes",
                self.rates.len(),
                self.grid.len()
            ));
        }
        if self.grid.iter().any(|g| !g.is_finite()) {
            return Err("grid contains non-finite values".to_string());
        }
        if self.grid.windows(2).any(|w| w[1] < w[0]) {
            return Err("grid is not non-decreasing".to_string());
        }
        if self.rates.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err("bin rate outside [0, 1]".to_string());
        }
        Ok(())
    }
}

/// Per-descriptor likelihood tables for a full descriptor key list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodEstimator {
    pub descriptors: Vec<DescriptorLikelihood>,
    pub epsilon: f64,
}

impl LikelihoodEstimator {
    /// Fit every descriptor column of `matrix` against `labels`.
    ///
    /// Inputs must already be validated: non-empty, rectangular, and
    /// row-aligned with `labels`.
    pub fn fit(matrix: &[Vec<f64>], labels: &[f64], config: &ClassifierConfig) -> Self {
        let columns = matrix.first().map_or(0, |row| row.len());
        let descriptors = (0..columns)
            .map(|d| DescriptorLikelihood::fit(&column(matrix, d), labels, config))
            .collect();

        Self {
            descriptors,
            epsilon: config.log_odds_epsilon,
        }
    }

    pub fn num_descriptors(&self) -> usize {
        self.descriptors.len()
    }

    /// Log-odds of `value` for descriptor `descriptor`
    pub fn lookup(&self, value: f64, descriptor: usize) -> f64 {
        self.descriptors[descriptor].lookup(value, self.epsilon)
    }

    /// Log-odds vector for one object
    pub fn log_odds_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(d, &value)| self.lookup(value, d))
            .collect()
    }

    /// Log-odds matrix for a batch of objects
    pub fn log_odds_matrix(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        matrix.iter().map(|row| self.log_odds_row(row)).collect()
    }
}
