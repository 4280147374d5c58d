//! Easy-ensemble boosting
//!
//! Each bag undersamples the training set to a balanced subset with its own
//! seed, fits an AdaBoost learner on it, and the ensemble predicts by
//! majority vote. The bags see different majority-class slices, so together
//! they cover far more of the majority class than any single balanced
//! subset could.

use crate::error::{Result, ShopsightError};
use crate::model::AdaBoostClassifier;
use crate::resample::{class_counts, RandomUnderSampler, Sampler, UnderSamplingStrategy};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Inner AdaBoost rounds per bag.
const INNER_ESTIMATORS: usize = 10;

/// Bagged ensemble of boosted learners over balanced subsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasyEnsemble {
    pub n_estimators: usize,
    pub strategy: UnderSamplingStrategy,
    pub seed: u64,
    learners: Vec<AdaBoostClassifier>,
    classes: Vec<i64>,
}

impl EasyEnsemble {
    pub fn new(n_estimators: usize, strategy: UnderSamplingStrategy, seed: u64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            strategy,
            seed,
            learners: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Fit one boosted learner per balanced bag
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
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
        self.classes = counts.keys().copied().collect();

        let strategy = self.strategy;
        let base_seed = self.seed;

        let learners: Result<Vec<AdaBoostClassifier>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|bag_idx| {
                let bag_seed = base_seed.wrapping_add(bag_idx as u64);
                let bag = RandomUnderSampler::new(strategy, bag_seed).fit_resample(x, y)?;

                let mut learner = AdaBoostClassifier::new(INNER_ESTIMATORS, 1.0);
                learner.fit(&bag.x, &bag.y)?;
                Ok(learner)
            })
            .collect();

        self.learners = learners?;
        Ok(self)
    }

    /// Predict by majority vote across bags
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        if self.learners.is_empty() {
            return Err(ShopsightError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<i64>> = self
            .learners
            .par_iter()
            .map(|learner| learner.predict(x))
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

    /// Number of fitted bags
    pub fn n_learners(&self) -> usize {
        self.learners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            data.push((i % 8) as f64);
            data.push((i / 8) as f64);
            labels.push(0i64);
        }
        for i in 0..8 {
            data.push(20.0 + (i % 4) as f64);
            data.push(20.0 + (i / 4) as f64);
            labels.push(1i64);
        }
        (
            Array2::from_shape_vec((48, 2), data).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_fit_predict_imbalanced() {
        let (x, y) = imbalanced_data();

        let mut model = EasyEnsemble::new(5, UnderSamplingStrategy::Auto, 1);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_learners(), 5);

        let preds = model.predict(&x).unwrap();
        let accuracy = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count() as f64
            / y.len() as f64;
        assert!(accuracy >= 0.9, "accuracy too low: {accuracy}");
    }

    #[test]
    fn test_same_seed_same_ensemble() {
        let (x, y) = imbalanced_data();

        let mut a = EasyEnsemble::new(4, UnderSamplingStrategy::Auto, 7);
        let mut b = EasyEnsemble::new(4, UnderSamplingStrategy::Auto, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = EasyEnsemble::new(3, UnderSamplingStrategy::Auto, 1);
        let x = Array2::zeros((2, 2));
        assert!(matches!(
            model.predict(&x),
            Err(ShopsightError::ModelNotFitted)
        ));
    }
}
