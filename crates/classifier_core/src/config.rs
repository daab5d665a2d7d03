//! Classifier configuration
//!
//! Numeric knobs for the likelihood estimator and the logistic calibrator.
//! Defaults reproduce the reference behaviour; a TOML file may override
//! any subset of fields.

use crate::errors::{ClassifierError, Result};
use crate::smoothing::MAX_KERNEL_RADIUS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Default number of grid nodes per descriptor
pub const DEFAULT_NODES: usize = 100;

/// Training and calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Grid nodes per descriptor (bins = nodes - 1)
    pub nodes: usize,
    /// Gaussian smoothing width along the bin axis, in bins
    pub smoothing_sigma: f64,
    /// Kernel radius in units of sigma
    pub smoothing_truncate: f64,
    /// Offset added inside both logarithms of the log-odds transform
    pub log_odds_epsilon: f64,
    /// Inverse L2 regularization strength of the calibrator
    pub regularization_c: f64,
    /// Newton iteration cap for the calibrator
    pub max_iterations: usize,
    /// Gradient-norm convergence threshold for the calibrator
    pub tolerance: f64,
    /// Fraction of rows reserved for calibration; `None` calibrates in-sample
    pub calibration_holdout: Option<f64>,
    /// Seed for the held-out split
    pub seed: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            nodes: DEFAULT_NODES,
            smoothing_sigma: 2.0,
            smoothing_truncate: 4.0,
            log_odds_epsilon: 1e-6,
            regularization_c: 100.0,
            max_iterations: 100,
            tolerance: 1e-8,
            calibration_holdout: None,
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading classifier configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClassifierConfig = toml::from_str(content)
            .map_err(|e| ClassifierError::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if self.nodes < 2 {
            return Err(ClassifierError::InvalidConfig(format!(
                "nodes must be at least 2, got {}",
                self.nodes
            )));
        }
        if !(self.smoothing_sigma >= 0.0) || !self.smoothing_sigma.is_finite() {
            return Err(ClassifierError::InvalidConfig(format!(
                "smoothing_sigma must be a finite value >= 0, got {}",
                self.smoothing_sigma
            )));
        }
        if !(self.smoothing_truncate > 0.0) || !self.smoothing_truncate.is_finite() {
            return Err(ClassifierError::InvalidConfig(format!(
                "smoothing_truncate must be a finite value > 0, got {}",
                self.smoothing_truncate
            )));
        }
        if self.smoothing_truncate * self.smoothing_sigma > MAX_KERNEL_RADIUS {
            return Err(ClassifierError::InvalidConfig(format!(
                "smoothing kernel radius {} exceeds {} bins",
                self.smoothing_truncate * self.smoothing_sigma,
                MAX_KERNEL_RADIUS
            )));
        }
        if !(self.log_odds_epsilon > 0.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "log_odds_epsilon must be > 0, got {}",
                self.log_odds_epsilon
            )));
        }
        if !(self.regularization_c > 0.0) || !self.regularization_c.is_finite() {
            return Err(ClassifierError::InvalidConfig(format!(
                "regularization_c must be a finite value > 0, got {}",
                self.regularization_c
            )));
        }
        if self.max_iterations == 0 {
            return Err(ClassifierError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance >= 0.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "tolerance must be >= 0, got {}",
                self.tolerance
            )));
        }
        if let Some(fraction) = self.calibration_holdout {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(ClassifierError::InvalidConfig(format!(
                    "calibration_holdout must lie in (0, 1), got {}",
                    fraction
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.nodes, 100);
        assert_eq!(config.regularization_c, 100.0);
        assert!(config.calibration_holdout.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClassifierConfig::from_toml_str("nodes = 20\nsmoothing_sigma = 1.5\n").unwrap();
        assert_eq!(config.nodes, 20);
        assert_eq!(config.smoothing_sigma, 1.5);
        assert_eq!(config.log_odds_epsilon, 1e-6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ClassifierConfig::default();
        config.nodes = 1;
        assert!(config.validate().is_err());

        let mut config = ClassifierConfig::default();
        config.regularization_c = 0.0;
        assert!(config.validate().is_err());

        let mut config = ClassifierConfig::default();
        config.calibration_holdout = Some(1.0);
        assert!(config.validate().is_err());

        assert!(ClassifierConfig::from_toml_str("nodes = \"many\"").is_err());
    }

    #[test]
    fn test_unbounded_smoothing_kernel_rejected() {
        assert!(matches!(
            ClassifierConfig::from_toml_str("smoothing_truncate = inf"),
            Err(ClassifierError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClassifierConfig::from_toml_str("smoothing_sigma = 1e300"),
            Err(ClassifierError::InvalidConfig(_))
        ));
        assert!(ClassifierConfig::from_toml_str("smoothing_sigma = 1000.0").is_ok());
    }
}
