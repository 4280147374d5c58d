//! AdaBoost (Adaptive Boosting)
//!
//! Boosted decision stumps; the inner learner of the easy-ensemble bags.
//! Misclassified samples gain weight between rounds so later stumps focus
//! on the hard region of the space.

use crate::error::{Result, ShopsightError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A single decision stump: one feature, one threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature_idx: usize,
    threshold: f64,
    /// Prediction when feature <= threshold
    left_label: i64,
    /// Prediction when feature > threshold
    right_label: i64,
}

impl Stump {
    fn predict_row(&self, x: &Array2<f64>, row: usize) -> i64 {
        if x[[row, self.feature_idx]] <= self.threshold {
            self.left_label
        } else {
            self.right_label
        }
    }
}

/// AdaBoost classifier over binary class indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    stumps: Vec<Stump>,
    alphas: Vec<f64>,
    classes: Vec<i64>,
    is_fitted: bool,
}

impl Default for AdaBoostClassifier {
    fn default() -> Self {
        Self::new(10, 1.0)
    }
}

impl AdaBoostClassifier {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            learning_rate,
            stumps: Vec::new(),
            alphas: Vec::new(),
            classes: Vec::new(),
            is_fitted: false,
        }
    }

    /// Best stump under the current sample weights.
    ///
    /// One sorted sweep per feature: left-side class weights accumulate
    /// sample by sample, and each boundary between distinct values is
    /// scored for both polarities in O(1).
    fn fit_stump(x: &Array2<f64>, y: &Array1<i64>, weights: &Array1<f64>, classes: &[i64]) -> Stump {
        let n_features = x.ncols();
        let n_samples = x.nrows();

        let total_w: [f64; 2] = y.iter().zip(weights.iter()).fold([0.0; 2], |mut acc, (&yi, &w)| {
            acc[usize::from(yi == classes[1])] += w;
            acc
        });

        let mut best = Stump {
            feature_idx: 0,
            threshold: f64::NEG_INFINITY,
            left_label: classes[0],
            right_label: classes[1],
        };
        // The empty-left stump predicts classes[1] everywhere; its error is
        // the total weight of classes[0].
        let mut best_error = total_w[0].min(total_w[1]);
        if total_w[1] < total_w[0] {
            best.left_label = classes[1];
            best.right_label = classes[0];
        }

        for feature_idx in 0..n_features {
            let mut ordered: Vec<(f64, usize, f64)> = (0..n_samples)
                .map(|i| {
                    (
                        x[[i, feature_idx]],
                        usize::from(y[i] == classes[1]),
                        weights[i],
                    )
                })
                .collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_w = [0.0f64; 2];
            for pos in 0..n_samples - 1 {
                let (value, slot, w) = ordered[pos];
                left_w[slot] += w;

                let next_value = ordered[pos + 1].0;
                if next_value <= value {
                    continue;
                }
                let threshold = (value + next_value) / 2.0;

                // left=classes[0], right=classes[1]
                let err_01 = left_w[1] + (total_w[0] - left_w[0]);
                // left=classes[1], right=classes[0]
                let err_10 = left_w[0] + (total_w[1] - left_w[1]);

                if err_01 < best_error {
                    best_error = err_01;
                    best = Stump {
                        feature_idx,
                        threshold,
                        left_label: classes[0],
                        right_label: classes[1],
                    };
                }
                if err_10 < best_error {
                    best_error = err_10;
                    best = Stump {
                        feature_idx,
                        threshold,
                        left_label: classes[1],
                        right_label: classes[0],
                    };
                }
            }
        }

        best
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut classes: Vec<i64> = y.iter().copied().collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() != 2 {
            return Err(ShopsightError::TrainingError(format!(
                "AdaBoost expects exactly 2 classes, got {}",
                classes.len()
            )));
        }
        self.classes = classes;

        let mut weights = Array1::from_elem(n_samples, 1.0 / n_samples as f64);
        self.stumps.clear();
        self.alphas.clear();

        for _round in 0..self.n_estimators {
            let stump = Self::fit_stump(x, y, &weights, &self.classes);

            let mut error = 0.0;
            let predictions: Vec<i64> =
                (0..n_samples).map(|i| stump.predict_row(x, i)).collect();
            for i in 0..n_samples {
                if predictions[i] != y[i] {
                    error += weights[i];
                }
            }

            // Clamp so a perfect or useless stump cannot blow up the log.
            error = error.clamp(1e-15, 1.0 - 1e-15);
            let alpha = self.learning_rate * ((1.0 - error) / error).ln();

            for i in 0..n_samples {
                if predictions[i] != y[i] {
                    weights[i] *= alpha.exp();
                }
            }
            let w_sum = weights.sum();
            if w_sum > 0.0 {
                weights /= w_sum;
            }

            self.stumps.push(stump);
            self.alphas.push(alpha);
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        if !self.is_fitted {
            return Err(ShopsightError::ModelNotFitted);
        }

        let n_samples = x.nrows();
        let predictions: Vec<i64> = (0..n_samples)
            .map(|i| {
                let mut scores = [0.0f64; 2];
                for (stump, &alpha) in self.stumps.iter().zip(self.alphas.iter()) {
                    let pred = stump.predict_row(x, i);
                    scores[usize::from(pred == self.classes[1])] += alpha;
                }
                if scores[1] > scores[0] {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
