//! ROI classifier core
//!
//! Turns per-object shape and intensity descriptors into the probability
//! that a detected region of interest is a genuine cell.
//!
//! Modules:
//! - `features`: descriptor records to dense, schema-checked matrices
//! - `likelihood`: rank-quantile binning and smoothed per-bin log-odds
//! - `smoothing`: Gaussian smoothing along the bin axis
//! - `calibrator`: L2-regularized logistic combination of log-odds
//! - `classifier`: training entry point and the Untrained/Trained classifier
//! - `model`: trained artifacts and their canonical JSON file format
//! - `prediction`: per-object probability/label pairs and summaries
//! - `session`: explicit working context (threshold, training list)
//! - `config`: numeric parameters, loadable from TOML

pub mod calibrator;
pub mod classifier;
pub mod config;
pub mod deterministic;
pub mod errors;
pub mod features;
pub mod likelihood;
pub mod model;
pub mod prediction;
pub mod serde_canon;
pub mod session;
pub mod smoothing;

pub use calibrator::{CalibrationWeights, Calibrator};
pub use classifier::{train_model, Classifier};
pub use config::ClassifierConfig;
pub use errors::{ClassifierError, Result};
pub use features::{build_feature_matrix, DescriptorRecord, FeatureMatrix};
pub use likelihood::{DescriptorLikelihood, LikelihoodEstimator};
pub use model::{Model, TrainingSummary};
pub use prediction::{Prediction, ProbabilitySummary};
pub use session::ClassifierSession;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
