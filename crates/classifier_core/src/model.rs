//! Trained classifier model and its on-disk representation
//!
//! A model holds the derived artifacts only: descriptor keys, per-descriptor
//! grids and smoothed bin rates, and calibration weights. Loading never
//! refits. Files are canonical JSON carrying a BLAKE3 hash of the model
//! body, checked on load.

use crate::calibrator::CalibrationWeights;
use crate::errors::{ClassifierError, Result};
use crate::features::{build_feature_matrix, check_columns, DescriptorRecord};
use crate::likelihood::LikelihoodEstimator;
use crate::prediction::Prediction;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Current model file format version
pub const MODEL_VERSION: u32 = 1;

/// Counts describing the data a model was fit on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Rows used to fit the likelihood tables
    pub objects: usize,
    /// Positive labels among those rows
    pub positives: usize,
    /// Rows used to fit the calibrator
    pub calibration_objects: usize,
    /// Newton iterations the calibrator ran
    pub calibration_iterations: usize,
}

/// Immutable trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub version: u32,
    /// Ordered descriptor schema
    pub keys: Vec<String>,
    pub likelihood: LikelihoodEstimator,
    pub calibration: CalibrationWeights,
    pub training: TrainingSummary,
    /// BLAKE3 hex digest of the canonical model body (this field excluded)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_hash: String,
}

impl Model {
    /// Assemble a model from fitted parts and stamp its hash
    pub fn new(
        keys: Vec<String>,
        likelihood: LikelihoodEstimator,
        calibration: CalibrationWeights,
        training: TrainingSummary,
    ) -> Result<Self> {
        let mut model = Self {
            version: MODEL_VERSION,
            keys,
            likelihood,
            calibration,
            training,
            model_hash: String::new(),
        };
        model.model_hash = model.compute_hash()?;
        Ok(model)
    }

    /// Hash of the model with the `model_hash` field left out
    pub fn compute_hash(&self) -> Result<String> {
        let body = Self {
            model_hash: String::new(),
            ..self.clone()
        };
        Ok(hash_canonical_hex(&body)?)
    }

    pub fn num_descriptors(&self) -> usize {
        self.keys.len()
    }

    /// Check version, shapes, monotone grids, finiteness and hash
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version != MODEL_VERSION {
            return Err(format!("unsupported model version: {}", self.version));
        }
        if self.keys.is_empty() {
            return Err("model has no descriptor keys".to_string());
        }
        let unique: HashSet<&String> = self.keys.iter().collect();
        if unique.len() != self.keys.len() {
            return Err("descriptor keys are not unique".to_string());
        }
        if self.likelihood.num_descriptors() != self.keys.len() {
            return Err(format!(
                "{} likelihood tables for {} keys",
                self.likelihood.num_descriptors(),
                self.keys.len()
            ));
        }
        if !(self.likelihood.epsilon > 0.0) || !self.likelihood.epsilon.is_finite() {
            return Err(format!("invalid log-odds epsilon: {}", self.likelihood.epsilon));
        }
        for (key, table) in self.keys.iter().zip(&self.likelihood.descriptors) {
            table.validate().map_err(|e| format!("descriptor '{}': {}", key, e))?;
        }
        self.calibration.validate(self.keys.len())?;

        let expected = self.compute_hash().map_err(|e| e.to_string())?;
        if self.model_hash != expected {
            return Err(format!(
                "model hash mismatch: file has '{}', content hashes to '{}'",
                self.model_hash, expected
            ));
        }
        Ok(())
    }

    /// Positive-class probability for each row of a descriptor matrix
    pub fn predict_matrix(&self, matrix: &[Vec<f64>]) -> Result<Vec<f64>> {
        check_columns(matrix, self.keys.len())?;
        Ok(matrix
            .iter()
            .map(|row| {
                let log_odds = self.likelihood.log_odds_row(row);
                self.calibration.predict(&log_odds)
            })
            .collect())
    }

    /// Predictions for descriptor records, using this model's key list
    pub fn predict_records(&self, records: &[DescriptorRecord]) -> Result<Vec<Prediction>> {
        let matrix = build_feature_matrix(records, &self.keys)?;
        let probabilities = self.predict_matrix(&matrix)?;
        Ok(probabilities.into_iter().map(Prediction::from_probability).collect())
    }

    /// Serialize model to canonical JSON
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// Write the model to `path` atomically.
    ///
    /// The JSON is written to a temporary file next to `path` and renamed
    /// over it; on failure the temporary file is removed and any existing
    /// file at `path` is left untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let save_failure = |reason: String| ClassifierError::SaveFailure {
            path: path.to_path_buf(),
            reason,
        };

        self.validate().map_err(save_failure)?;
        let json = self.to_canonical_json().map_err(|e| save_failure(e.to_string()))?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staged = NamedTempFile::new_in(&directory).map_err(|e| save_failure(e.to_string()))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| save_failure(e.to_string()))?;
        staged.persist(path).map_err(|e| save_failure(e.error.to_string()))?;

        info!(
            "Saved classifier model to {} ({} descriptors, hash {})",
            path.display(),
            self.keys.len(),
            self.model_hash
        );
        Ok(())
    }

    /// Read and validate a model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_failure = |reason: String| ClassifierError::LoadFailure {
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| load_failure(e.to_string()))?;
        let model: Model = serde_json::from_str(&json).map_err(|e| load_failure(e.to_string()))?;
        model.validate().map_err(load_failure)?;

        debug!("Loaded classifier model {} from {}", model.model_hash, path.display());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::DescriptorLikelihood;
    use tempfile::tempdir;

    fn create_test_model() -> Model {
        let likelihood = LikelihoodEstimator {
            descriptors: vec![
                DescriptorLikelihood {
                    grid: vec![0.0, 1.0, 2.0],
                    rates: vec![0.1, 0.9],
                },
                DescriptorLikelihood {
                    grid: vec![-1.0, 0.0, 1.0],
                    rates: vec![0.5, 0.5],
                },
            ],
            epsilon: 1e-6,
        };
        let calibration = CalibrationWeights {
            weights: vec![1.0, 0.0],
            bias: 0.0,
        };
        let training = TrainingSummary {
            objects: 10,
            positives: 5,
            calibration_objects: 10,
            calibration_iterations: 4,
        };
        Model::new(vec!["npix".to_string(), "skew".to_string()], likelihood, calibration, training).unwrap()
    }

    #[test]
    fn test_model_validates() {
        let model = create_test_model();
        assert_eq!(model.version, MODEL_VERSION);
        assert_eq!(model.model_hash.len(), 64);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_predict_matrix() {
        let model = create_test_model();
        let probabilities = model.predict_matrix(&[vec![1.5, 0.0], vec![0.5, 0.0]]).unwrap();

        // log-odds of 0.9 and 0.1 pass straight through a unit weight
        assert!((probabilities[0] - 0.9).abs() < 1e-5);
        assert!((probabilities[1] - 0.1).abs() < 1e-5);

        assert!(matches!(
            model.predict_matrix(&[vec![1.0]]),
            Err(ClassifierError::SchemaMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        let model = create_test_model();

        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();

        assert_eq!(model, loaded);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_tampered_file_fails_hash_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        create_test_model().save(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, json.replace("0.9", "0.8")).unwrap();

        let err = Model::load(&path).unwrap_err();
        match err {
            ClassifierError::LoadFailure { reason, .. } => assert!(reason.contains("hash mismatch")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut model = create_test_model();
        model.keys.push("compact".to_string());
        model.model_hash = model.compute_hash().unwrap();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_save_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("classifier.json");

        let err = create_test_model().save(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::SaveFailure { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        let model = create_test_model();
        model.save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut broken = model.clone();
        broken.calibration.bias = f64::NAN;
        assert!(broken.save(&path).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
