//! Error types for the phishlens core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, saving or validating a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("model artifact is corrupt ({}): {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("feature names do not match the extractor schema: {reason}")]
    FeatureMismatch { reason: String },

    #[error("failed to write model artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode model artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ModelError {
    /// True for the "model not available" conditions (absent or unreadable
    /// artifact), as opposed to a write failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ModelError::Missing { .. }
                | ModelError::Corrupt { .. }
                | ModelError::FeatureMismatch { .. }
        )
    }
}

/// Errors raised while fitting a classifier.
#[derive(Debug, Error, PartialEq)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptyDataset,

    #[error("{records} feature rows but {targets} labels")]
    TargetLength { records: usize, targets: usize },

    #[error("row {row} has label {label}, expected 0 or 1")]
    LabelOutOfRange { row: usize, label: usize },

    #[error("n_estimators must be at least 1")]
    NoEstimators,
}

/// Errors raised while reading a labeled URL dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("test fraction must be in [0, 1), got {0}")]
    InvalidTestFraction(f64),
}
