//! Random forest: bootstrap-bagged CART trees with random feature subsets.
//!
//! Probabilities are the mean of the per-tree leaf class fractions and
//! feature importances are the mean Gini decrease, so a fitted forest exposes
//! the same narrow surface an off-the-shelf ensemble would.

mod tree;

pub use tree::DecisionTree;

use crate::error::TrainError;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tree::TreeParams;

/// Binary classification only: 0 = legitimate, 1 = phishing.
pub const N_CLASSES: usize = 2;

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features inspected per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on `records` (one row per example) and `targets` (0 or 1).
    pub fn fit(
        params: &ForestParams,
        records: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, usize>,
    ) -> Result<Self, TrainError> {
        let (n_samples, n_features) = records.dim();
        if params.n_estimators == 0 {
            return Err(TrainError::NoEstimators);
        }
        if n_samples == 0 {
            return Err(TrainError::EmptyDataset);
        }
        if targets.len() != n_samples {
            return Err(TrainError::TargetLength {
                records: n_samples,
                targets: targets.len(),
            });
        }
        if let Some((row, &label)) = targets.iter().enumerate().find(|(_, &t)| t >= N_CLASSES) {
            return Err(TrainError::LabelOutOfRange { row, label });
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features: params
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
                .clamp(1, n_features.max(1)),
        };

        // One seed per tree, drawn up front, keeps parallel fitting deterministic.
        let mut master = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.gen()).collect();

        let trees: Vec<DecisionTree> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(records, targets, samples, &tree_params, rng)
            })
            .collect();

        debug!(
            trees = trees.len(),
            samples = n_samples,
            features = n_features,
            max_features = tree_params.max_features,
            "fitted random forest"
        );

        Ok(Self {
            params: params.clone(),
            n_features,
            trees,
        })
    }

    /// `[p(legitimate), p(phishing)]`, summing to 1.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; N_CLASSES] {
        let p0 = self
            .trees
            .iter()
            .map(|t| t.predict_proba(row)[0])
            .sum::<f64>()
            / self.trees.len().max(1) as f64;
        let p0 = p0.clamp(0.0, 1.0);
        [p0, 1.0 - p0]
    }

    /// 1 if phishing is strictly more probable, else 0.
    pub fn predict(&self, row: &[f64]) -> usize {
        let [p0, p1] = self.predict_proba(row);
        usize::from(p1 > p0)
    }

    /// Mean normalized Gini importance per feature, summing to 1.
    ///
    /// Single-leaf trees carry no split information and are skipped. If no
    /// tree split at all, every importance is 0.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_features];
        let mut informative = 0usize;
        for tree in self.trees.iter().filter(|t| t.node_count() > 1) {
            informative += 1;
            for (s, imp) in sums.iter_mut().zip(tree.feature_importances()) {
                *s += imp;
            }
        }
        if informative == 0 {
            return sums;
        }
        let total: f64 = sums.iter().sum();
        if total > 0.0 {
            for s in &mut sums {
                *s /= total;
            }
        }
        sums
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural check for a deserialized forest.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(format!(
                    "tree {i} has {} features, forest has {}",
                    tree.n_features(),
                    self.n_features
                ));
            }
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}
