//! Balanced random forest

use crate::error::{Result, ShopsightError};
use crate::model::DecisionTree;
use crate::resample::{class_counts, class_indices};
use clap::ValueEnum;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How many features each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaxFeaturesRule {
    /// Equivalent to `Sqrt`
    Auto,
    /// Square root of the feature count
    Sqrt,
    /// Log2 of the feature count
    Log2,
}

impl MaxFeaturesRule {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeaturesRule::Auto | MaxFeaturesRule::Sqrt => n.sqrt().ceil() as usize,
            MaxFeaturesRule::Log2 => n.log2().ceil() as usize,
        };
        k.clamp(1, n_features)
    }
}

/// Random forest where every tree trains on a class-balanced bootstrap: each
/// class contributes the same number of rows, drawn with replacement, so the
/// majority class cannot dominate any tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancedRandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeaturesRule,
    pub seed: u64,
    n_features: usize,
    classes: Vec<i64>,
    feature_importances: Option<Array1<f64>>,
}

impl BalancedRandomForest {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeaturesRule::Auto,
            seed,
            n_features: 0,
            classes: Vec::new(),
            feature_importances: None,
        }
    }

    /// Set maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples per leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the feature subsampling rule
    pub fn with_max_features(mut self, rule: MaxFeaturesRule) -> Self {
        self.max_features = rule;
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(ShopsightError::TrainingError(
                "need at least 2 classes to fit a classifier".to_string(),
            ));
        }

        self.n_features = n_features;
        self.classes = counts.keys().copied().collect();

        let min_count = counts.values().copied().min().unwrap_or(0);
        let indices = class_indices(y);
        // Class pools in label order; HashMap iteration would make the
        // bootstrap depend on hasher state.
        let pools: Vec<&Vec<usize>> = self.classes.iter().map(|c| &indices[c]).collect();

        let max_features = self.max_features.resolve(n_features);
        let base_seed = self.seed;
        let max_depth = self.max_depth;
        let min_samples_leaf = self.min_samples_leaf;

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let tree_seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);

                // Balanced bootstrap: min_count draws with replacement per class.
                let mut sample_indices: Vec<usize> =
                    Vec::with_capacity(min_count * pools.len());
                for pool in &pools {
                    for _ in 0..min_count {
                        sample_indices.push(pool[rng.gen_range(0..pool.len())]);
                    }
                }

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<i64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new()
                    .with_min_samples_leaf(min_samples_leaf)
                    .with_max_features(max_features)
                    .with_seed(tree_seed);
                if let Some(d) = max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (slot, &val) in total.iter_mut().zip(imp.iter()) {
                    *slot += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for v in &mut total {
            *v /= n_trees;
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for v in &mut total {
                *v /= sum;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total));
    }

    /// Predict by majority vote across trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        if self.trees.is_empty() {
            return Err(ShopsightError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<i64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;

        let n_samples = x.nrows();
        let predictions: Vec<i64> = (0..n_samples)
            .map(|i| {
                let mut votes = vec![0usize; self.classes.len()];
                for preds in &all_predictions {
                    if let Ok(slot) = self.classes.binary_search(&preds[i]) {
                        votes[slot] += 1;
                    }
                }
                // Ties resolve toward the lower label.
                let best = votes
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
                    .map(|(slot, _)| slot)
                    .unwrap_or(0);
                self.classes[best]
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Averaged, normalized impurity importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..24 {
            rows.push([(i % 6) as f64, (i / 6) as f64]);
            labels.push(0i64);
        }
        for i in 0..6 {
            rows.push([10.0 + (i % 3) as f64, 10.0 + (i / 3) as f64]);
            labels.push(1i64);
        }
        let x = Array2::from_shape_fn((30, 2), |(i, j)| rows[i][j]);
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_fit_predict_imbalanced() {
        let (x, y) = imbalanced_data();

        let mut forest = BalancedRandomForest::new(10, 1);
        forest.fit(&x, &y).unwrap();

        let preds = forest.predict(&x).unwrap();
        let accuracy = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count() as f64
            / y.len() as f64;
        assert!(accuracy >= 0.9, "accuracy too low: {accuracy}");
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = imbalanced_data();

        let mut forest =
            BalancedRandomForest::new(10, 1).with_max_features(MaxFeaturesRule::Sqrt);
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances().unwrap();
        assert_eq!(imp.len(), x.ncols());
        assert!(imp.iter().all(|&v| v >= 0.0));
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = imbalanced_data();

        let mut a = BalancedRandomForest::new(5, 3);
        let mut b = BalancedRandomForest::new(5, 3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_max_features_rules() {
        assert_eq!(MaxFeaturesRule::Sqrt.resolve(16), 4);
        assert_eq!(MaxFeaturesRule::Auto.resolve(16), 4);
        assert_eq!(MaxFeaturesRule::Log2.resolve(16), 4);
        assert_eq!(MaxFeaturesRule::Log2.resolve(32), 5);
        assert_eq!(MaxFeaturesRule::Sqrt.resolve(1), 1);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0, 0];
        let mut forest = BalancedRandomForest::new(3, 1);
        assert!(forest.fit(&x, &y).is_err());
    }
}
