//! Two-stage classifier: likelihood tables followed by logistic calibration
//!
//! `train_model` validates a labelled matrix, fits one likelihood table per
//! descriptor, maps the training rows to log-odds through those same
//! tables, and fits the calibrator on the result. `Classifier` wraps the
//! resulting `Model` in an Untrained/Trained state machine.

use crate::calibrator::Calibrator;
use crate::config::ClassifierConfig;
use crate::deterministic::holdout_split;
use crate::errors::{ClassifierError, Result};
use crate::features::{check_columns, DescriptorRecord};
use crate::likelihood::LikelihoodEstimator;
use crate::model::{Model, TrainingSummary};
use crate::prediction::Prediction;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Reject inputs that the numeric stages cannot fit.
///
/// Checks happen here, before any binning or regression, so the fitting
/// routines can assume a rectangular, finite, two-class training set.
pub fn validate_training_set(matrix: &[Vec<f64>], labels: &[f64], keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        return Err(ClassifierError::DegenerateTraining(
            "descriptor key list is empty".to_string(),
        ));
    }
    if matrix.is_empty() {
        return Err(ClassifierError::DegenerateTraining(
            "training matrix has no objects".to_string(),
        ));
    }
    if labels.len() != matrix.len() {
        return Err(ClassifierError::DegenerateTraining(format!(
            "{} labels for {} objects",
            labels.len(),
            matrix.len()
        )));
    }
    check_columns(matrix, keys.len())?;

    for (object, row) in matrix.iter().enumerate() {
        if let Some(d) = row.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidDescriptor {
                object,
                key: keys[d].clone(),
            });
        }
    }
    if let Some(object) = labels.iter().position(|&l| l != 0.0 && l != 1.0) {
        return Err(ClassifierError::DegenerateTraining(format!(
            "label of object {} is {}, expected 0 or 1",
            object, labels[object]
        )));
    }
    check_both_classes(labels, "training set")
}

fn check_both_classes(labels: &[f64], what: &str) -> Result<()> {
    let positives = labels.iter().filter(|&&l| l == 1.0).count();
    if positives == 0 || positives == labels.len() {
        return Err(ClassifierError::DegenerateTraining(format!(
            "{} contains only one class ({} of {} positive)",
            what,
            positives,
            labels.len()
        )));
    }
    Ok(())
}

fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

/// Fit a complete model from a labelled training matrix.
///
/// By default the calibrator is fit on the same rows as the likelihood
/// tables. With `calibration_holdout` set, a seeded split reserves that
/// fraction of rows for the calibrator instead.
pub fn train_model(
    matrix: &[Vec<f64>],
    labels: &[f64],
    keys: &[String],
    config: &ClassifierConfig,
) -> Result<Model> {
    config.validate()?;
    validate_training_set(matrix, labels, keys)?;

    let (fit_rows, fit_labels, cal_rows, cal_labels) = match config.calibration_holdout {
        None => (matrix.to_vec(), labels.to_vec(), matrix.to_vec(), labels.to_vec()),
        Some(fraction) => {
            let (kept, held) = holdout_split(matrix.len(), fraction, config.seed);
            let fit_labels = select(labels, &kept);
            let cal_labels = select(labels, &held);
            check_both_classes(&fit_labels, "likelihood split")?;
            check_both_classes(&cal_labels, "calibration split")?;
            (select(matrix, &kept), fit_labels, select(matrix, &held), cal_labels)
        }
    };

    let likelihood = LikelihoodEstimator::fit(&fit_rows, &fit_labels, config);
    let log_odds = likelihood.log_odds_matrix(&cal_rows);
    let fit = Calibrator::new(config).fit(&log_odds, &cal_labels);
    if !fit.converged {
        warn!("calibrator stopped after {} iterations without converging", fit.iterations);
    }

    let training = TrainingSummary {
        objects: fit_rows.len(),
        positives: fit_labels.iter().filter(|&&l| l == 1.0).count(),
        calibration_objects: cal_rows.len(),
        calibration_iterations: fit.iterations,
    };
    info!(
        "Trained classifier on {} objects ({} positive), {} descriptors, calibration in {} iterations",
        training.objects,
        training.positives,
        keys.len(),
        training.calibration_iterations
    );

    Model::new(keys.to_vec(), likelihood, fit.weights, training)
}

/// Classifier holding at most one trained model.
///
/// The model sits behind an `Arc`: retraining or loading installs a new
/// model and never mutates one that callers may still hold.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
    model: Option<Arc<Model>>,
}

impl Classifier {
    /// Untrained classifier
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config, model: None }
    }

    /// Trained classifier wrapping an existing model
    pub fn with_model(config: ClassifierConfig, model: Model) -> Self {
        Self {
            config,
            model: Some(Arc::new(model)),
        }
    }

    /// Classifier initialised from a model file.
    ///
    /// A load failure is returned alongside an Untrained classifier so the
    /// caller can decide whether to retrain or give up.
    pub fn from_file<P: AsRef<Path>>(config: ClassifierConfig, path: P) -> (Self, Result<()>) {
        let mut classifier = Self::new(config);
        let outcome = classifier.load(path);
        (classifier, outcome)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Shared handle to the current model
    pub fn model(&self) -> Option<Arc<Model>> {
        self.model.clone()
    }

    /// Descriptor keys of the current model
    pub fn keys(&self) -> Option<&[String]> {
        self.model.as_deref().map(|m| m.keys.as_slice())
    }

    fn trained_model(&self) -> Result<&Model> {
        self.model.as_deref().ok_or(ClassifierError::NotTrained)
    }

    /// Fit a new model and install it.
    ///
    /// On failure the previously installed model, if any, is kept.
    pub fn train(&mut self, matrix: &[Vec<f64>], labels: &[f64], keys: &[String]) -> Result<Arc<Model>> {
        let model = Arc::new(train_model(matrix, labels, keys, &self.config)?);
        self.model = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Predict descriptor records with the trained tables and weights
    pub fn predict(&self, records: &[DescriptorRecord]) -> Result<Vec<Prediction>> {
        self.trained_model()?.predict_records(records)
    }

    /// Positive-class probabilities for a matrix in the model's key order
    pub fn predict_matrix(&self, matrix: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.trained_model()?.predict_matrix(matrix)
    }

    /// Persist the current model
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.trained_model()?.save(path)
    }

    /// Replace the current model with one read from disk.
    ///
    /// Any failure leaves the classifier Untrained and is returned as
    /// `LoadFailure`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        match Model::load(path) {
            Ok(model) => {
                self.model = Some(Arc::new(model));
                Ok(())
            }
            Err(err) => {
                warn!("{}", err);
                self.model = None;
                Err(err)
            }
        }
    }

    /// Drop the current model
    pub fn reset(&mut self) {
        self.model = None;
    }
}
