//! Single-URL analysis: extract features, classify, and rank the features the
//! model relies on most.

use crate::error::ModelError;
use crate::features::{extract, FeatureVector, FEATURE_COUNT};
use crate::model::{ClassProbabilities, Classifier, Label, ModelArtifact};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info};

/// One feature's value for the analyzed URL and its global importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub name: String,
    pub value: f64,
    pub importance: f64,
}

/// Result of analyzing one URL.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub url: String,
    pub label: Label,
    pub probabilities: ClassProbabilities,
    /// Probability of `label`.
    pub confidence: f64,
    pub features: FeatureVector,
    /// All features, most important first.
    pub ranked: Vec<FeatureContribution>,
}

impl Analysis {
    pub fn is_phishing(&self) -> bool {
        self.label == Label::Phishing
    }

    /// The `n` most important features (fewer if the schema is smaller).
    pub fn top(&self, n: usize) -> &[FeatureContribution] {
        &self.ranked[..n.min(self.ranked.len())]
    }
}

/// A loaded, validated model ready to analyze URLs. Cheap to share behind an
/// `Arc`; analysis takes `&self`.
#[derive(Debug)]
pub struct Detector {
    artifact: ModelArtifact,
    /// `(position, importance)` sorted by importance, descending.
    ranking: Vec<(usize, f64)>,
}

impl Detector {
    /// Load the artifact pair from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let detector = Self::from_artifact(ModelArtifact::load(dir)?)?;
        info!(
            dir = %dir.display(),
            trees = detector.artifact.forest().trees().len(),
            "detector ready"
        );
        Ok(detector)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate_alignment()?;

        let importances = artifact.classifier().feature_importances();
        if importances.len() != artifact.feature_names().len() {
            return Err(ModelError::FeatureMismatch {
                reason: format!(
                    "{} importances for {} feature names",
                    importances.len(),
                    artifact.feature_names().len()
                ),
            });
        }

        let mut ranking: Vec<(usize, f64)> = importances.into_iter().enumerate().collect();
        // Stable: equal importances keep schema order.
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(Self { artifact, ranking })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.artifact.classifier()
    }

    /// Feature names with their global importance, most important first.
    pub fn importances(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.ranking
            .iter()
            .map(|&(i, imp)| (self.artifact.feature_names()[i].as_str(), imp))
    }

    /// Classify `url` and explain the result.
    ///
    /// Never fails on odd input (feature extraction is total); an error here
    /// means the classifier and extractor disagree on the vector width.
    pub fn analyze(&self, url: &str) -> Result<Analysis, ModelError> {
        let features = extract(url);
        let classifier = self.classifier();
        if classifier.n_features() != FEATURE_COUNT {
            return Err(ModelError::FeatureMismatch {
                reason: format!(
                    "classifier expects {} features, got {FEATURE_COUNT}",
                    classifier.n_features()
                ),
            });
        }

        let probabilities = classifier.predict_proba(features.values());
        let label = probabilities.label();
        let ranked = self
            .ranking
            .iter()
            .map(|&(i, importance)| FeatureContribution {
                name: self.artifact.feature_names()[i].clone(),
                value: features.values()[i],
                importance,
            })
            .collect();

        debug!(
            url,
            %label,
            phishing = probabilities.phishing,
            "analyzed url"
        );

        Ok(Analysis {
            url: url.to_string(),
            label,
            confidence: probabilities.confidence(),
            probabilities,
            features,
            ranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::toy_dataset;
    use crate::features::FEATURE_NAMES;
    use crate::forest::ForestParams;
    use crate::model::train;

    fn toy_detector() -> Detector {
        let examples: Vec<_> = toy_dataset()
            .iter()
            .map(|ex| (extract(&ex.url), ex.label))
            .collect();
        let artifact = train(&examples, &ForestParams::default()).unwrap();
        Detector::from_artifact(artifact).unwrap()
    }

    #[test]
    fn test_toy_verdicts() {
        let detector = toy_detector();

        let legit = detector.analyze("https://www.google.com").unwrap();
        assert_eq!(legit.label, Label::Legitimate);
        assert!(!legit.is_phishing());

        let phish = detector.analyze("http://login.banking-secure.com").unwrap();
        assert_eq!(phish.label, Label::Phishing);
        assert!(phish.confidence >= 0.5);

        for a in [&legit, &phish] {
            let p = a.probabilities;
            assert!((p.legitimate + p.phishing - 1.0).abs() < 1e-9);
            assert_eq!(a.confidence, p.of(a.label));
        }
    }

    #[test]
    fn test_ranking_is_sorted_and_complete() {
        let detector = toy_detector();
        let analysis = detector.analyze("http://secure-banking.com").unwrap();

        assert_eq!(analysis.ranked.len(), FEATURE_COUNT);
        assert!(analysis
            .ranked
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
        let total: f64 = analysis.ranked.iter().map(|c| c.importance).sum();
        assert!((total - 1.0).abs() < 1e-6);

        let mut names: Vec<&str> = analysis.ranked.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, FEATURE_NAMES.to_vec());

        assert_eq!(analysis.top(5).len(), 5);
        assert_eq!(analysis.top(100).len(), FEATURE_COUNT);
        assert_eq!(analysis.top(5)[0], analysis.ranked[0]);
    }

    #[test]
    fn test_ties_keep_schema_order() {
        let detector = toy_detector();
        let zeros: Vec<&str> = detector
            .importances()
            .filter(|(_, imp)| *imp == 0.0)
            .map(|(name, _)| name)
            .collect();
        let mut sorted = zeros.clone();
        sorted.sort_unstable();
        assert_eq!(zeros, sorted);
    }

    #[test]
    fn test_contribution_values_match_features() {
        let detector = toy_detector();
        let analysis = detector.analyze("http://192.168.0.1:8080/login").unwrap();
        for c in &analysis.ranked {
            let feature = crate::Feature::from_name(&c.name).unwrap();
            assert_eq!(c.value, analysis.features.get(feature));
        }
    }

    #[test]
    fn test_malformed_url_still_analyzed() {
        let detector = toy_detector();
        for url in ["", "not a url", "http://[::1", "ftp://files.example.org/a b"] {
            let analysis = detector.analyze(url).unwrap();
            assert_eq!(analysis.url, url);
            assert_eq!(analysis.ranked.len(), FEATURE_COUNT);
        }
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        toy_detector().artifact().save(dir.path()).unwrap();
        let detector = Detector::load(dir.path()).unwrap();
        assert_eq!(
            detector.analyze("https://www.github.com").unwrap().label,
            Label::Legitimate
        );
    }
}
