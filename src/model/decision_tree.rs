//! Decision tree classifier

use crate::error::{Result, ShopsightError};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: i64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// CART classification tree with Gini impurity.
///
/// `max_features` limits how many randomly drawn feature columns each split
/// considers, which is what makes forest trees decorrelated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub seed: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set how many features each split considers
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set random seed for feature subsampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ShopsightError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut classes: Vec<i64> = y.iter().copied().collect();
        classes.sort_unstable();
        classes.dedup();

        let mut importances = vec![0.0; n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices: Vec<usize> = (0..n_samples).collect();

        self.root = Some(self.build_tree(x, y, &classes, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        classes: &[i64],
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = Self::count_classes(y, classes, indices);
        let parent_impurity = Self::gini(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || parent_impurity == 0.0;

        if should_stop {
            return TreeNode::Leaf {
                class: Self::majority_class(&counts, classes),
            };
        }

        let Some((feature_idx, threshold, gain)) =
            self.find_best_split(x, y, classes, indices, parent_impurity, rng)
        else {
            return TreeNode::Leaf {
                class: Self::majority_class(&counts, classes),
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf
            || right_indices.len() < self.min_samples_leaf
        {
            return TreeNode::Leaf {
                class: Self::majority_class(&counts, classes),
            };
        }

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, classes, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, classes, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
        }
    }

    /// Best (feature, threshold, gini gain) among a random feature subset.
    ///
    /// Each candidate feature is scanned with a single sorted sweep:
    /// left-side class counts accumulate sample by sample and every boundary
    /// between distinct values is a candidate threshold.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        classes: &[i64],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let n_to_try = self.max_features.unwrap_or(n_features).min(n_features);

        let mut feature_pool: Vec<usize> = (0..n_features).collect();
        feature_pool.shuffle(rng);
        feature_pool.truncate(n_to_try);
        feature_pool.sort_unstable();

        let n = indices.len();
        let total_counts = Self::count_classes(y, classes, indices);

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &feature_pool {
            let mut ordered: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (x[[i, feature_idx]], Self::class_slot(y[i], classes)))
                .collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_counts = vec![0usize; classes.len()];
            for (pos, &(value, slot)) in ordered.iter().enumerate().take(n - 1) {
                left_counts[slot] += 1;

                let next_value = ordered[pos + 1].0;
                if next_value <= value {
                    continue;
                }

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }

                let right_counts: Vec<usize> = total_counts
                    .iter()
                    .zip(left_counts.iter())
                    .map(|(&t, &l)| t - l)
                    .collect();

                let weighted = (left_n as f64 * Self::gini(&left_counts, left_n)
                    + right_n as f64 * Self::gini(&right_counts, right_n))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, (value + next_value) / 2.0, gain));
                }
            }
        }

        best
    }

    fn class_slot(label: i64, classes: &[i64]) -> usize {
        classes.binary_search(&label).unwrap_or(0)
    }

    fn count_classes(y: &Array1<i64>, classes: &[i64], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; classes.len()];
        for &i in indices {
            counts[Self::class_slot(y[i], classes)] += 1;
        }
        counts
    }

    fn gini(counts: &[usize], n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        let sum_sq: f64 = counts
            .iter()
            .map(|&c| {
                let p = c as f64 / n as f64;
                p * p
            })
            .sum();
        1.0 - sum_sq
    }

    fn majority_class(counts: &[usize], classes: &[i64]) -> i64 {
        counts
            .iter()
            .enumerate()
            .max_by_key(|(_, &c)| c)
            .map(|(slot, _)| classes[slot])
            .unwrap_or(0)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let root = self.root.as_ref().ok_or(ShopsightError::ModelNotFitted)?;

        let predictions: Vec<i64> = (0..x.nrows())
            .map(|i| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { class } => return *class,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if x[[i, *feature_idx]] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Impurity-based feature importances, normalized to sum 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}
