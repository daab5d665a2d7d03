//! Explicit working context for interactive classification
//!
//! Holds the state a front end needs between calls: the classifier, the
//! decision threshold, the list of training label files and the most
//! recent predictions. The classifier itself carries model state only.

use crate::classifier::Classifier;
use crate::errors::{ClassifierError, Result};
use crate::features::DescriptorRecord;
use crate::prediction::{relabel, summarize, Prediction, ProbabilitySummary, DEFAULT_THRESHOLD};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ClassifierSession {
    pub classifier: Classifier,
    threshold: f64,
    training_files: Vec<PathBuf>,
    predictions: Vec<Prediction>,
}

impl ClassifierSession {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            threshold: DEFAULT_THRESHOLD,
            training_files: Vec::new(),
            predictions: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Change the decision threshold and re-label the current predictions
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ClassifierError::InvalidConfig(format!(
                "threshold must lie in [0, 1], got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        self.predictions = relabel(&self.predictions, threshold);
        Ok(())
    }

    /// Classify a recording's descriptor records and keep the result
    pub fn classify(&mut self, records: &[DescriptorRecord]) -> Result<&[Prediction]> {
        let predictions = self.classifier.predict(records)?;
        self.predictions = relabel(&predictions, self.threshold);
        if let Some(summary) = summarize(&self.predictions) {
            info!(
                "Classified {} objects: {} cells, {} non-cells, probability range [{:.3}, {:.3}]",
                self.predictions.len(),
                summary.positives,
                summary.negatives,
                summary.min,
                summary.max
            );
        }
        Ok(&self.predictions)
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn summary(&self) -> Option<ProbabilitySummary> {
        summarize(&self.predictions)
    }

    pub fn training_files(&self) -> &[PathBuf] {
        &self.training_files
    }

    pub fn set_training_files(&mut self, files: Vec<PathBuf>) {
        self.training_files = files;
    }

    /// Append a label file to the training list unless already listed.
    ///
    /// Returns whether the file was added.
    pub fn add_training_file<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        if self.training_files.iter().any(|f| f == path) {
            return false;
        }
        self.training_files.push(path.to_path_buf());
        true
    }
}
