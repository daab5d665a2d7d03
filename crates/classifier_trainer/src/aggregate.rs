//! Merge labelled sessions into a single training set
//!
//! Sessions are read in input order. A session whose label or descriptor
//! file cannot be read, or whose label count differs from its record
//! count, is skipped and reported; the remaining sessions still
//! contribute. A record missing one of the requested descriptors fails
//! the whole aggregation.

use roiclass_core::{build_feature_matrix, ClassifierError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::dataset::{descriptor_path_for, load_descriptor_records, load_labels};
use crate::errors::TrainerError;

/// A session left out of the training set, with the reason
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedSession {
    pub path: PathBuf,
    pub reason: String,
}

/// Merged training rows plus bookkeeping about which sessions were used
#[derive(Clone, Debug, Default)]
pub struct TrainingSet {
    pub matrix: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    pub accepted: Vec<PathBuf>,
    pub skipped: Vec<SkippedSession>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1.0).count()
    }
}

/// Rows of one validated session
struct SessionRows {
    matrix: Vec<Vec<f64>>,
    labels: Vec<f64>,
}

fn load_session(label_path: &Path, keys: &[String]) -> Result<SessionRows, TrainerError> {
    let rejected = |reason: String| TrainerError::SessionValidation {
        path: label_path.to_path_buf(),
        reason,
    };

    let labels = load_labels(label_path).map_err(|e| rejected(format!("{:#}", e)))?;

    let descriptor_path = descriptor_path_for(label_path);
    let records = load_descriptor_records(&descriptor_path)
        .map_err(|e| rejected(format!("{}: {:#}", descriptor_path.display(), e)))?;

    if labels.len() != records.len() {
        return Err(rejected(format!(
            "{} labels but {} descriptor records",
            labels.len(),
            records.len()
        )));
    }

    let matrix = build_feature_matrix(&records, keys).map_err(|e| match e {
        ClassifierError::MissingDescriptor { object, key } => TrainerError::MissingDescriptor {
            path: label_path.to_path_buf(),
            object,
            key,
        },
        other => rejected(other.to_string()),
    })?;

    Ok(SessionRows {
        matrix,
        labels: labels
            .iter()
            .map(|row| if row.is_cell { 1.0 } else { 0.0 })
            .collect(),
    })
}

/// Merge the sessions named by `session_paths` (label file paths).
///
/// Returns `EmptyTrainingSet` when no session is accepted.
pub fn aggregate<P: AsRef<Path>>(session_paths: &[P], keys: &[String]) -> Result<TrainingSet, TrainerError> {
    let mut set = TrainingSet::default();

    for path in session_paths {
        let path = path.as_ref();
        match load_session(path, keys) {
            Ok(rows) => {
                info!("{}: added {} objects to training set", path.display(), rows.labels.len());
                set.matrix.extend(rows.matrix);
                set.labels.extend(rows.labels);
                set.accepted.push(path.to_path_buf());
            }
            Err(TrainerError::SessionValidation { path, reason }) => {
                warn!("{}: skipped ({})", path.display(), reason);
                set.skipped.push(SkippedSession { path, reason });
            }
            Err(fatal) => return Err(fatal),
        }
    }

    if set.accepted.is_empty() {
        return Err(TrainerError::EmptyTrainingSet);
    }

    info!(
        "Training set: {} objects ({} positive) from {} sessions, {} skipped",
        set.len(),
        set.positives(),
        set.accepted.len(),
        set.skipped.len()
    );
    Ok(set)
}
