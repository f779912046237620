//! CART decision tree for binary classification (Gini impurity).

use super::N_CLASSES;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        proba: [f64; N_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    /// `n_left * gini(left) + n_right * gini(right)`
    child_impurity: f64,
}

struct Grower<'a> {
    records: ArrayView2<'a, f64>,
    targets: ArrayView1<'a, usize>,
    params: &'a TreeParams,
    rng: StdRng,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed,
    /// which is how bootstrap weights are expressed).
    pub(crate) fn fit(
        records: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, usize>,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: StdRng,
    ) -> Self {
        let mut grower = Grower {
            records,
            targets,
            params,
            rng,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; records.ncols()],
        };
        grower.grow(samples, 0);

        let total: f64 = grower.impurity_decrease.iter().sum();
        let importances = if total > 0.0 {
            grower.impurity_decrease.iter().map(|d| d / total).collect()
        } else {
            grower.impurity_decrease
        };

        Self {
            nodes: grower.nodes,
            importances,
        }
    }

    /// Class fractions of the leaf `row` falls into.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; N_CLASSES] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Normalized Gini importances (all zero for a single-leaf tree).
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Number of features the tree was fitted on.
    pub fn n_features(&self) -> usize {
        self.importances.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural sanity check used when loading a persisted forest.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } => {
                    let sum: f64 = proba.iter().sum();
                    if proba.iter().any(|p| !p.is_finite() || *p < 0.0) || (sum - 1.0).abs() > 1e-9 {
                        return Err(format!("node {i}: invalid leaf probabilities"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Children are always pushed after their parent.
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {i}: child index out of range"));
                    }
                    if *feature >= self.importances.len() || !threshold.is_finite() {
                        return Err(format!("node {i}: invalid split"));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Grower<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let impurity = gini(&counts);
        let at_depth_limit = self.params.max_depth.is_some_and(|d| depth >= d);

        if impurity == 0.0 || samples.len() < self.params.min_samples_split || at_depth_limit {
            return self.leaf(&counts);
        }
        let Some(split) = self.best_split(&samples) else {
            return self.leaf(&counts);
        };

        self.impurity_decrease[split.feature] +=
            samples.len() as f64 * impurity - split.child_impurity;

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.records[[i, split.feature]] <= split.threshold);

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: [0.0; N_CLASSES],
        });
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn leaf(&mut self, counts: &[usize; N_CLASSES]) -> usize {
        let total: usize = counts.iter().sum();
        let mut proba = [0.0; N_CLASSES];
        if total > 0 {
            for (p, &c) in proba.iter_mut().zip(counts) {
                *p = c as f64 / total as f64;
            }
        }
        self.nodes.push(Node::Leaf { proba });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> [usize; N_CLASSES] {
        let mut counts = [0usize; N_CLASSES];
        for &i in samples {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    /// Visit features in random order. At least `max_features` are inspected;
    /// past that, the search stops as soon as any valid split is known.
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let mut order: Vec<usize> = (0..self.records.ncols()).collect();
        order.shuffle(&mut self.rng);

        let mut best: Option<Split> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_threshold(samples, feature) {
                if best.map_or(true, |b| candidate.child_impurity < b.child_impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<Split> {
        let mut points: Vec<(f64, usize)> = samples
            .iter()
            .map(|&i| (self.records[[i, feature]], self.targets[i]))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = self.class_counts(samples);
        let n = points.len();
        if n < 2 {
            return None;
        }
        let mut left = [0usize; N_CLASSES];
        let mut best: Option<Split> = None;

        for i in 0..n - 1 {
            left[points[i].1] += 1;
            let (lo, hi) = (points[i].0, points[i + 1].0);
            if lo == hi {
                continue;
            }
            let mut right = total;
            for (r, l) in right.iter_mut().zip(&left) {
                *r -= l;
            }
            let n_left = (i + 1) as f64;
            let n_right = (n - i - 1) as f64;
            let child_impurity = n_left * gini(&left) + n_right * gini(&right);

            if best.map_or(true, |b| child_impurity < b.child_impurity) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    child_impurity,
                });
            }
        }
        best
    }
}

fn gini(counts: &[usize; N_CLASSES]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
