use std::path::PathBuf;
use thiserror::Error;

use roiclass_core::ClassifierError;

/// Errors returned while assembling training data or running the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("session {path} rejected: {reason}")]
    SessionValidation { path: PathBuf, reason: String },

    #[error("session {path}: object {object} is missing descriptor '{key}'")]
    MissingDescriptor {
        path: PathBuf,
        object: usize,
        key: String,
    },

    #[error("no training session was accepted")]
    EmptyTrainingSet,

    #[error("training list {path}: {reason}")]
    TrainingList { path: PathBuf, reason: String },

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}
