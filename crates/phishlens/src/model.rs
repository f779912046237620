//! Classifier adapter: the narrow contract the detector relies on, and the
//! persisted model artifact (classifier + feature-name order + metadata).

use crate::error::{ModelError, TrainError};
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::forest::{ForestParams, RandomForest};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding the serialized classifier.
pub const MODEL_FILE: &str = "phishing_detector_model.json";
/// File holding the ordered feature-name list used at training time.
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Binary verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Legitimate = 0,
    Phishing = 1,
}

impl Label {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Legitimate => f.write_str("legitimate"),
            Label::Phishing => f.write_str("phishing"),
        }
    }
}

/// Per-class probabilities; the two always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub legitimate: f64,
    pub phishing: f64,
}

impl ClassProbabilities {
    pub fn from_pair([p0, p1]: [f64; 2]) -> Self {
        Self {
            legitimate: p0,
            phishing: p1,
        }
    }

    /// The more probable label (ties go to legitimate).
    pub fn label(&self) -> Label {
        if self.phishing > self.legitimate {
            Label::Phishing
        } else {
            Label::Legitimate
        }
    }

    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::Legitimate => self.legitimate,
            Label::Phishing => self.phishing,
        }
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.of(self.label())
    }
}

/// What the detector needs from a trained model. Any ensemble that can
/// answer these questions over the [`FEATURE_NAMES`] vector layout can stand
/// in for the bundled random forest.
pub trait Classifier: Send + Sync {
    /// Width of the vectors the classifier was trained on.
    fn n_features(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> ClassProbabilities;

    fn predict(&self, features: &[f64]) -> Label {
        self.predict_proba(features).label()
    }

    /// One importance per feature, positionally aligned with the training
    /// feature names.
    fn feature_importances(&self) -> Vec<f64>;
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }

    fn predict_proba(&self, features: &[f64]) -> ClassProbabilities {
        ClassProbabilities::from_pair(RandomForest::predict_proba(self, features))
    }

    fn feature_importances(&self) -> Vec<f64> {
        RandomForest::feature_importances(self)
    }
}

/// Facts about how an artifact was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub training_samples: usize,
    pub phishing_samples: usize,
    pub crate_version: String,
}

#[derive(Serialize, Deserialize)]
struct StoredModel {
    metadata: ModelMetadata,
    forest: RandomForest,
}

/// A trained classifier together with the feature-name order it was fitted on.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    forest: RandomForest,
    feature_names: Vec<String>,
    metadata: ModelMetadata,
}

impl ModelArtifact {
    pub fn classifier(&self) -> &dyn Classifier {
        &self.forest
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Check the stored names against the extractor schema, name by name and
    /// position by position.
    pub fn validate_alignment(&self) -> Result<(), ModelError> {
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(ModelError::FeatureMismatch {
                reason: format!(
                    "artifact has {} feature names, extractor produces {FEATURE_COUNT}",
                    self.feature_names.len()
                ),
            });
        }
        if let Some((i, (stored, expected))) = self
            .feature_names
            .iter()
            .zip(FEATURE_NAMES)
            .enumerate()
            .find(|(_, (stored, expected))| stored.as_str() != *expected)
        {
            return Err(ModelError::FeatureMismatch {
                reason: format!("position {i}: artifact has {stored:?}, extractor has {expected:?}"),
            });
        }
        if self.forest.n_features() != FEATURE_COUNT {
            return Err(ModelError::FeatureMismatch {
                reason: format!(
                    "classifier expects {} features, extractor produces {FEATURE_COUNT}",
                    self.forest.n_features()
                ),
            });
        }
        Ok(())
    }

    /// Write both artifact files into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), ModelError> {
        std::fs::create_dir_all(dir).map_err(|source| ModelError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let stored = StoredModel {
            metadata: self.metadata.clone(),
            forest: self.forest.clone(),
        };
        write_json(&dir.join(MODEL_FILE), &stored)?;
        write_json(&dir.join(FEATURE_NAMES_FILE), &self.feature_names)?;

        info!(dir = %dir.display(), trees = self.forest.trees().len(), "saved model artifact");
        Ok(())
    }

    /// Read both artifact files from `dir` and validate them.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let model_path = dir.join(MODEL_FILE);
        let names_path = dir.join(FEATURE_NAMES_FILE);

        let stored: StoredModel = read_json(&model_path)?;
        let feature_names: Vec<String> = read_json(&names_path)?;

        if stored.metadata.format_version != FORMAT_VERSION {
            return Err(ModelError::Corrupt {
                path: model_path,
                reason: format!(
                    "format version {} (expected {FORMAT_VERSION})",
                    stored.metadata.format_version
                ),
            });
        }
        stored
            .forest
            .validate()
            .map_err(|reason| ModelError::Corrupt {
                path: model_path.clone(),
                reason,
            })?;

        let artifact = Self {
            forest: stored.forest,
            feature_names,
            metadata: stored.metadata,
        };
        artifact.validate_alignment()?;

        debug!(
            dir = %dir.display(),
            created_at = %artifact.metadata.created_at,
            "loaded model artifact"
        );
        Ok(artifact)
    }
}

/// Fit a classifier on labeled feature vectors.
pub fn train(
    examples: &[(FeatureVector, Label)],
    params: &ForestParams,
) -> Result<ModelArtifact, TrainError> {
    if examples.is_empty() {
        return Err(TrainError::EmptyDataset);
    }

    let records = Array2::from_shape_fn((examples.len(), FEATURE_COUNT), |(i, j)| {
        examples[i].0.values()[j]
    });
    let targets: Array1<usize> = examples.iter().map(|(_, label)| label.index()).collect();

    let forest = RandomForest::fit(params, records.view(), targets.view())?;
    let phishing_samples = examples
        .iter()
        .filter(|(_, l)| *l == Label::Phishing)
        .count();

    Ok(ModelArtifact {
        forest,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        metadata: ModelMetadata {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            training_samples: examples.len(),
            phishing_samples,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

/// Both artifact paths inside `dir`, model first.
pub fn artifact_paths(dir: &Path) -> [PathBuf; 2] {
    [dir.join(MODEL_FILE), dir.join(FEATURE_NAMES_FILE)]
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let bytes = serde_json::to_vec(value)?;
    std::fs::write(path, bytes).map_err(|source| ModelError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ModelError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ModelError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(ModelError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| ModelError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
