//! SMOTE oversampling

use crate::error::{Result, ShopsightError};
use crate::resample::{
    class_counts, class_indices, OverSamplingStrategy, ResampleResult, Sampler,
};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, BTreeMap};

/// Ordered distance/index pair for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// SMOTE (Synthetic Minority Over-sampling Technique)
///
/// Raises each selected class to the majority count by interpolating between
/// a class member and one of its k nearest same-class neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    strategy: OverSamplingStrategy,
    seed: u64,
    k_neighbors: usize,
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl Smote {
    pub fn new(strategy: OverSamplingStrategy, seed: u64) -> Self {
        Self {
            strategy,
            seed,
            k_neighbors: 5,
            target_counts: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Euclidean distance
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Find k nearest neighbors using a BinaryHeap (O(n log k))
    fn find_neighbors(point: &[f64], data: &[Vec<f64>], skip: usize, k: usize) -> Vec<usize> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, d) in data.iter().enumerate() {
            if i == skip {
                continue;
            }
            let dist = Self::distance(point, d);
            if heap.len() < k {
                heap.push(DistIdx(dist, i));
            } else if let Some(&DistIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistIdx(_, i)| i).collect()
    }

    /// Interpolate a synthetic sample between two points
    fn generate_sample(point: &[f64], neighbor: &[f64], rng: &mut ChaCha8Rng) -> Vec<f64> {
        let gap: f64 = rng.gen();
        point
            .iter()
            .zip(neighbor.iter())
            .map(|(&p, &n)| p + gap * (n - p))
            .collect()
    }
}

impl Sampler for Smote {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(ShopsightError::ResamplingError(
                "need at least 2 classes to oversample".to_string(),
            ));
        }
        self.target_counts = Some(self.strategy.target_counts(&counts));
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self.target_counts.as_ref().ok_or_else(|| {
            ShopsightError::ResamplingError("SMOTE not fitted".to_string())
        })?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let counts = class_counts(y);
        let n_features = x.ncols();

        // Only synthetic rows are materialized; originals are reused from x.
        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = Vec::new();

        // targets is a BTreeMap, so generation order is the label order and
        // the output is reproducible for a given seed.
        for (&class, &target_count) in targets {
            let current_count = counts.get(&class).copied().unwrap_or(0);
            let n_to_generate = target_count.saturating_sub(current_count);

            if n_to_generate == 0 {
                n_synthetic.push(0);
                continue;
            }

            let class_idx = &indices[&class];
            let class_samples: Vec<Vec<f64>> = class_idx
                .iter()
                .map(|&i| x.row(i).iter().copied().collect())
                .collect();

            if class_samples.len() < 2 {
                // A single-member class has no neighbors to interpolate with;
                // duplicate it instead of looping forever.
                let lone = &class_samples[0];
                for _ in 0..n_to_generate {
                    synthetic_x.push(lone.clone());
                    synthetic_y.push(class);
                }
                n_synthetic.push(n_to_generate);
                continue;
            }

            let k = self.k_neighbors.min(class_samples.len() - 1);

            for _ in 0..n_to_generate {
                let idx = rng.gen_range(0..class_samples.len());
                let sample = &class_samples[idx];

                let neighbors = Self::find_neighbors(sample, &class_samples, idx, k);
                let neighbor = &class_samples[neighbors[rng.gen_range(0..neighbors.len())]];

                synthetic_x.push(Self::generate_sample(sample, neighbor, &mut rng));
                synthetic_y.push(class);
            }

            n_synthetic.push(n_to_generate);
        }

        // Original rows first, synthetic rows appended.
        let n_original = x.nrows();
        let n_total = n_original + synthetic_x.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });

        let mut all_y: Vec<i64> = y.iter().copied().collect();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}
