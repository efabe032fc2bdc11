//! Random forest classifier
//!
//! Bagged CART trees grown on Gini impurity. Each tree sees a bootstrap
//! sample of the corpus and, at every node, a random subset of
//! `sqrt(n_features)` informative features. Trees are fully grown by default.
//! Prediction averages the leaf class distributions of all trees.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::features::FeatureColumn;
use crate::error::InferenceError;

/// Default number of trees in the ensemble
pub const DEFAULT_TREES: usize = 100;

/// Default seed for bootstrap and feature sampling
pub const DEFAULT_SEED: u64 = 42;

/// Values closer than this are treated as equal when searching for splits
const VALUE_EPSILON: f64 = 1e-12;

/// Hyperparameters for the forest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Base seed; tree `i` uses `seed + i`
    pub seed: u64,
    /// Maximum depth of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Best split found at a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Read-only view of the training data shared by every node of a tree
struct GrowContext<'a> {
    columns: &'a [&'a [f64]],
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    config: &'a ForestConfig,
}

/// A single CART classification tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Gini impurity of a node from its class counts
fn gini_impurity(counts: &[usize], total: usize) -> f64 {
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

fn class_counts(samples: &[usize], labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in samples {
        counts[labels[i]] += 1;
    }
    counts
}

impl DecisionTree {
    fn fit(ctx: &GrowContext<'_>, samples: Vec<usize>, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(ctx, samples, 0, rng);
        tree
    }

    /// Grow a subtree from `samples` and return the index of its root
    fn grow(
        &mut self,
        ctx: &GrowContext<'_>,
        samples: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(&samples, ctx.labels, ctx.n_classes);
        let total = samples.len();
        let distribution = counts
            .iter()
            .map(|&c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
            .collect();

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { distribution });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = ctx.config.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || total < ctx.config.min_samples_split {
            return index;
        }

        let Some(split) = Self::best_split(ctx, &samples, &counts, rng) else {
            return index;
        };

        let column = ctx.columns[split.feature];
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| column[i] <= split.threshold);

        let left = self.grow(ctx, left, depth + 1, rng);
        let right = self.grow(ctx, right, depth + 1, rng);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Search a random subset of features for the split with the largest
    /// Gini reduction.
    ///
    /// Features are visited in random order; constant features do not count
    /// towards `max_features`, so the search keeps drawing until it has seen
    /// that many informative ones or runs out.
    fn best_split(
        ctx: &GrowContext<'_>,
        samples: &[usize],
        parent_counts: &[usize],
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n = samples.len();
        let parent_gini = gini_impurity(parent_counts, n);
        let min_leaf = ctx.config.min_samples_leaf.max(1);

        let mut order: Vec<usize> = (0..ctx.columns.len()).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;

        for feature in order {
            if visited >= ctx.max_features {
                break;
            }

            let column = ctx.columns[feature];
            let mut pairs: Vec<(f64, usize)> =
                samples.iter().map(|&i| (column[i], ctx.labels[i])).collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            if (pairs[n - 1].0 - pairs[0].0).abs() < VALUE_EPSILON {
                continue;
            }
            visited += 1;

            let mut left_counts = vec![0usize; ctx.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for i in 0..n - 1 {
                let (value, label) = pairs[i];
                left_counts[label] += 1;
                right_counts[label] -= 1;

                let left_n = i + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                // Never split between equal values
                let next_value = pairs[i + 1].0;
                if (next_value - value).abs() < VALUE_EPSILON {
                    continue;
                }

                let weighted_child_gini = (left_n as f64 / n as f64)
                    * gini_impurity(&left_counts, left_n)
                    + (right_n as f64 / n as f64) * gini_impurity(&right_counts, right_n);
                let gain = parent_gini - weighted_child_gini;

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = value + (next_value - value) / 2.0;
                    if threshold >= next_value {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Class distribution of the leaf reached by `row`
    fn leaf_distribution(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Trained ensemble, bound to the feature names and class labels it was fit on
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    classes: Vec<String>,
}

impl RandomForest {
    /// Fit the ensemble.
    ///
    /// # Arguments
    /// * `features` - Training columns, in the order rows will be presented at prediction time
    /// * `labels` - Class index per row (indices into `classes`)
    /// * `classes` - Class labels
    /// * `config` - Forest hyperparameters
    pub fn fit(
        features: &[FeatureColumn],
        labels: &[usize],
        classes: &[String],
        config: &ForestConfig,
    ) -> Self {
        let n_samples = labels.len();
        let columns: Vec<&[f64]> = features.iter().map(|f| f.values.as_slice()).collect();
        let max_features = ((features.len() as f64).sqrt() as usize).max(1);

        let ctx = GrowContext {
            columns: &columns,
            labels,
            n_classes: classes.len(),
            max_features,
            config,
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let bootstrap: Vec<usize> = (0..n_samples)
                    .map(|_| rng.gen_range(0..n_samples))
                    .collect();
                DecisionTree::fit(&ctx, bootstrap, &mut rng)
            })
            .collect();

        Self {
            trees,
            feature_names: features.iter().map(|f| f.name.clone()).collect(),
            classes: classes.to_vec(),
        }
    }

    /// Mean class probabilities across all trees
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if row.len() != self.feature_names.len() {
            return Err(InferenceError::FeatureMismatch {
                expected: self.feature_names.len(),
                found: row.len(),
            });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    /// Most probable class for `row`; ties go to the first class in label order
    pub fn predict(&self, row: &[f64]) -> Result<&str, InferenceError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (i, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best].as_str())
    }

    /// Fraction of rows whose predicted class matches `labels`
    pub fn accuracy(&self, features: &[FeatureColumn], labels: &[usize]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let correct = (0..labels.len())
            .filter(|&i| {
                let row: Vec<f64> = features.iter().map(|f| f.values[i]).collect();
                self.predict(&row)
                    .map(|label| label == self.classes[labels[i]])
                    .unwrap_or(false)
            })
            .count();
        correct as f64 / labels.len() as f64
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::FeatureKind;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn separable_features() -> (Vec<FeatureColumn>, Vec<usize>) {
        let signal: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let noise: Vec<f64> = (0..30).map(|i| ((i * 7) % 5) as f64).collect();
        let labels: Vec<usize> = (0..30).map(|i| if i < 15 { 0 } else { 1 }).collect();
        (
            vec![
                FeatureColumn::new("signal", FeatureKind::Numeric, signal),
                FeatureColumn::new("noise", FeatureKind::Numeric, noise),
            ],
            labels,
        )
    }

    #[test]
    fn test_gini_impurity() {
        assert_eq!(gini_impurity(&[5, 0], 5), 0.0);
        assert!((gini_impurity(&[5, 5], 10) - 0.5).abs() < 1e-12);
        assert_eq!(gini_impurity(&[0, 0], 0), 0.0);
    }

    #[test]
    fn test_forest_learns_separable_data() {
        let (features, labels) = separable_features();
        let forest = RandomForest::fit(
            &features,
            &labels,
            &classes(&["Balanced", "Low_Carb"]),
            &ForestConfig {
                n_trees: 25,
                ..Default::default()
            },
        );

        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(&[2.0, 1.0]).unwrap(), "Balanced");
        assert_eq!(forest.predict(&[27.0, 1.0]).unwrap(), "Low_Carb");
        assert!(forest.accuracy(&features, &labels) > 0.9);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let (features, labels) = separable_features();
        let config = ForestConfig {
            n_trees: 10,
            ..Default::default()
        };
        let labels_names = classes(&["A", "B"]);
        let a = RandomForest::fit(&features, &labels, &labels_names, &config);
        let b = RandomForest::fit(&features, &labels, &labels_names, &config);

        for x in [0.0, 7.5, 14.5, 15.0, 29.0] {
            let row = [x, 2.0];
            assert_eq!(a.predict_proba(&row).unwrap(), b.predict_proba(&row).unwrap());
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (features, labels) = separable_features();
        let forest = RandomForest::fit(
            &features,
            &labels,
            &classes(&["A", "B"]),
            &ForestConfig {
                n_trees: 8,
                ..Default::default()
            },
        );
        let proba = forest.predict_proba(&[14.0, 3.0]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_row_width_mismatch_errors() {
        let (features, labels) = separable_features();
        let forest = RandomForest::fit(
            &features,
            &labels,
            &classes(&["A", "B"]),
            &ForestConfig {
                n_trees: 2,
                ..Default::default()
            },
        );
        let err = forest.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::FeatureMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let (features, labels) = separable_features();
        let forest = RandomForest::fit(
            &features,
            &labels,
            &classes(&["A", "B"]),
            &ForestConfig {
                n_trees: 3,
                max_depth: Some(1),
                ..Default::default()
            },
        );
        assert!(forest.trees().iter().all(|t| t.node_count() <= 3));
    }

    #[test]
    fn test_constant_features_produce_single_leaf() {
        let features = vec![FeatureColumn::new("flat", FeatureKind::Numeric, vec![1.0; 6])];
        let labels = vec![0, 1, 0, 1, 0, 1];
        let forest = RandomForest::fit(
            &features,
            &labels,
            &classes(&["A", "B"]),
            &ForestConfig {
                n_trees: 4,
                ..Default::default()
            },
        );
        assert!(forest.trees().iter().all(|t| t.node_count() == 1));
        assert!(forest.predict(&[1.0]).is_ok());
    }
}
