//! phishlens: classify URLs as legitimate or phishing.
//!
//! A URL string is mapped to a fixed 23-slot lexical feature vector
//! ([`features::extract`]) and scored by a random forest
//! ([`forest::RandomForest`]) that was trained on vectors with the same
//! schema. The feature schema is declared once ([`features::Feature`]) and
//! its name order is stored next to every trained model, so training and
//! inference always agree on which position means what.

pub mod dataset;
pub mod detector;
pub mod error;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;

pub use detector::{Analysis, Detector, FeatureContribution};
pub use error::{DatasetError, ModelError, TrainError};
pub use features::{extract, Feature, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestParams, RandomForest};
pub use model::{train, ClassProbabilities, Classifier, Label, ModelArtifact};
