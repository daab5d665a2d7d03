//! Error types for the classifier core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while training, applying or persisting a classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Model file missing, corrupt or schema-mismatched
    #[error("failed to load model from {path}: {reason}")]
    LoadFailure { path: PathBuf, reason: String },

    /// Model could not be written to its destination
    #[error("failed to save model to {path}: {reason}")]
    SaveFailure { path: PathBuf, reason: String },

    /// A descriptor record lacks one of the model's keys
    #[error("object {object} is missing descriptor '{key}'")]
    MissingDescriptor { object: usize, key: String },

    /// A descriptor value is NaN
    #[error("object {object} has a non-numeric value for descriptor '{key}'")]
    InvalidDescriptor { object: usize, key: String },

    /// Empty training matrix or single-class labels
    #[error("degenerate training set: {0}")]
    DegenerateTraining(String),

    /// Matrix shape does not agree with the descriptor key list
    #[error("schema mismatch: expected {expected} columns, found {found}")]
    SchemaMismatch { expected: usize, found: usize },

    /// Prediction requested before a model was trained or loaded
    #[error("classifier has no trained model")]
    NotTrained,

    /// Configuration values out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for classifier core operations
pub type Result<T> = std::result::Result<T, ClassifierError>;
