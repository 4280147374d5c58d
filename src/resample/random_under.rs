//! Random undersampling

use crate::error::{Result, ShopsightError};
use crate::resample::{
    class_counts, class_indices, ResampleResult, Sampler, UnderSamplingStrategy,
};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random undersampler (drops samples from over-represented classes)
///
/// Selected classes are reduced to the minority count by sampling without
/// replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomUnderSampler {
    strategy: UnderSamplingStrategy,
    seed: u64,
}

impl RandomUnderSampler {
    pub fn new(strategy: UnderSamplingStrategy, seed: u64) -> Self {
        Self { strategy, seed }
    }
}

impl Sampler for RandomUnderSampler {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if class_counts(y).len() < 2 {
            return Err(ShopsightError::ResamplingError(
                "need at least 2 classes to undersample".to_string(),
            ));
        }
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let counts = class_counts(y);
        let targets = self.strategy.target_counts(&counts);
        let indices = class_indices(y);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut selected: Vec<usize> = Vec::new();

        // targets iterates in label order; only the per-class draw consumes
        // randomness, so the output is a pure function of (data, seed).
        for (&class, &target) in &targets {
            let class_idx = &indices[&class];
            if target >= class_idx.len() {
                selected.extend_from_slice(class_idx);
            } else {
                let mut shuffled = class_idx.clone();
                shuffled.shuffle(&mut rng);
                selected.extend(shuffled.into_iter().take(target));
            }
        }

        // Keep original row order within the reduced set.
        selected.sort_unstable();

        let result_x = x.select(Axis(0), &selected);
        let result_y = Array1::from_vec(selected.iter().map(|&i| y[i]).collect());

        Ok(ResampleResult {
            x: result_x,
            y: result_y,
            n_synthetic: vec![0; counts.len()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..30 {
            data.push(i as f64);
            data.push((i * 2) as f64);
            labels.push(0i64);
        }
        for i in 0..6 {
            data.push(100.0 + i as f64);
            data.push(200.0 + i as f64);
            labels.push(1i64);
        }

        let x = Array2::from_shape_vec((36, 2), data).unwrap();
        let y = Array1::from_vec(labels);
        (x, y)
    }

    #[test]
    fn test_auto_balances_to_minority_count() {
        let (x, y) = imbalanced_data();

        let mut sampler = RandomUnderSampler::new(UnderSamplingStrategy::Auto, 1);
        let result = sampler.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 6);
        assert_eq!(counts[&1], 6);
        assert_eq!(result.x.nrows(), 12);
    }

    #[test]
    fn test_rows_are_drawn_from_input() {
        let (x, y) = imbalanced_data();

        let mut sampler = RandomUnderSampler::new(UnderSamplingStrategy::Auto, 9);
        let result = sampler.fit_resample(&x, &y).unwrap();

        for row in result.x.rows() {
            let found = x.rows().into_iter().any(|orig| orig == row);
            assert!(found, "undersampled row not present in input");
        }
    }

    #[test]
    fn test_same_seed_same_selection() {
        let (x, y) = imbalanced_data();

        let a = RandomUnderSampler::new(UnderSamplingStrategy::Auto, 5)
            .fit_resample(&x, &y)
            .unwrap();
        let b = RandomUnderSampler::new(UnderSamplingStrategy::Auto, 5)
            .fit_resample(&x, &y)
            .unwrap();
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_not_majority_keeps_majority_intact() {
        let (x, y) = imbalanced_data();

        let mut sampler = RandomUnderSampler::new(UnderSamplingStrategy::NotMajority, 1);
        let result = sampler.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 30);
        assert_eq!(counts[&1], 6);
    }
}
