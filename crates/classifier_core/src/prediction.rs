//! Per-object predictions and batch summaries

use serde::{Deserialize, Serialize};

/// Default decision threshold on the positive-class probability
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Probability and boolean label for one object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub is_cell: bool,
    pub probability: f64,
}

impl Prediction {
    /// Label with the default threshold (`probability > 0.5`)
    pub fn from_probability(probability: f64) -> Self {
        Self::with_threshold(probability, DEFAULT_THRESHOLD)
    }

    /// Label with a caller-chosen threshold (`probability > threshold`)
    pub fn with_threshold(probability: f64, threshold: f64) -> Self {
        Self {
            is_cell: probability > threshold,
            probability,
        }
    }

    /// Two-column output row: label (0/1) then probability
    pub fn as_row(&self) -> [f64; 2] {
        [if self.is_cell { 1.0 } else { 0.0 }, self.probability]
    }
}

/// Re-label a batch against a new threshold without touching probabilities
pub fn relabel(predictions: &[Prediction], threshold: f64) -> Vec<Prediction> {
    predictions
        .iter()
        .map(|p| Prediction::with_threshold(p.probability, threshold))
        .collect()
}

/// Range and label counts of a prediction batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilitySummary {
    pub min: f64,
    pub mid: f64,
    pub max: f64,
    pub positives: usize,
    pub negatives: usize,
}

/// Summarize a batch; `None` for an empty batch.
///
/// `mid` is the midpoint of the observed probability range.
pub fn summarize(predictions: &[Prediction]) -> Option<ProbabilitySummary> {
    if predictions.is_empty() {
        return None;
    }
    let (min, max) = predictions.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.probability), hi.max(p.probability))
    });
    let positives = predictions.iter().filter(|p| p.is_cell).count();

    Some(ProbabilitySummary {
        min,
        mid: min + (max - min) / 2.0,
        max,
        positives,
        negatives: predictions.len() - positives,
    })
}
