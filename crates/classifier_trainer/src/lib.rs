//! ROI classifier trainer
//!
//! Builds training sets from labelled recording sessions and fits
//! classifier models from them.

pub mod aggregate;
pub mod dataset;
pub mod errors;
pub mod training_list;

use roiclass_core::{train_model, ClassifierConfig, ClassifierSession, Model};
use std::path::Path;

pub use aggregate::{aggregate, SkippedSession, TrainingSet};
pub use dataset::{descriptor_path_for, load_descriptor_records, load_labels, write_predictions, LabelRow};
pub use errors::TrainerError;
pub use training_list::{read_training_list, write_training_list};

/// Aggregate the given sessions and fit a model on the merged rows.
pub fn train_from_sessions<P: AsRef<Path>>(
    session_paths: &[P],
    keys: &[String],
    config: &ClassifierConfig,
) -> Result<(Model, TrainingSet), TrainerError> {
    let set = aggregate(session_paths, keys)?;
    let model = train_model(&set.matrix, &set.labels, keys, config)?;
    Ok((model, set))
}

/// Add a session to the working training list and retrain on the list.
///
/// The session is appended only if it is not listed yet. The descriptor
/// keys of the currently installed model are reused; `keys` is required
/// when no model is installed.
pub fn retrain_with_session<P: AsRef<Path>>(
    session: &mut ClassifierSession,
    label_path: P,
    keys: Option<&[String]>,
) -> Result<TrainingSet, TrainerError> {
    let keys: Vec<String> = match (session.classifier.keys(), keys) {
        (Some(current), _) => current.to_vec(),
        (None, Some(given)) => given.to_vec(),
        (None, None) => {
            return Err(TrainerError::Classifier(roiclass_core::ClassifierError::NotTrained));
        }
    };
    session.add_training_file(label_path);

    let set = aggregate(session.training_files(), &keys)?;
    session.classifier.train(&set.matrix, &set.labels, &keys)?;
    Ok(set)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
