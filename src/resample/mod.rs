//! Training-set rebalancing
//!
//! Samplers rewrite an imbalanced training partition into a balanced one.
//! Oversamplers raise selected classes to the majority count, undersamplers
//! lower selected classes to the minority count; which classes are selected
//! is the sampling strategy.

mod random_under;
mod smote;

pub use random_under::RandomUnderSampler;
pub use smote::Smote;

use crate::error::Result;
use clap::ValueEnum;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Result of resampling a training partition.
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Synthetic/duplicated sample count per class, in label order
    pub n_synthetic: Vec<usize>,
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Which classes an oversampler raises to the majority count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverSamplingStrategy {
    /// Equivalent to `NotMajority`
    Auto,
    /// Only the rarest class
    Minority,
    /// Every class except the rarest
    NotMinority,
    /// Every class except the most frequent
    NotMajority,
    /// Every class
    All,
}

/// Which classes an undersampler lowers to the minority count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnderSamplingStrategy {
    /// Equivalent to `Majority`
    Auto,
    /// Only the most frequent class
    Majority,
    /// Every class except the rarest
    NotMinority,
    /// Every class except the most frequent
    NotMajority,
    /// Every class
    All,
}

impl OverSamplingStrategy {
    /// Target count per class. Selected classes are raised to the majority
    /// count, the rest keep their current count.
    pub fn target_counts(&self, counts: &BTreeMap<i64, usize>) -> BTreeMap<i64, usize> {
        let (minority, majority, max_count) = extremes(counts);

        counts
            .iter()
            .map(|(&class, &count)| {
                let selected = match self {
                    OverSamplingStrategy::Minority => class == minority,
                    OverSamplingStrategy::NotMinority => class != minority,
                    OverSamplingStrategy::Auto | OverSamplingStrategy::NotMajority => {
                        class != majority
                    }
                    OverSamplingStrategy::All => true,
                };
                let target = if selected { max_count.max(count) } else { count };
                (class, target)
            })
            .collect()
    }
}

impl UnderSamplingStrategy {
    /// Target count per class. Selected classes are lowered to the minority
    /// count, the rest keep their current count.
    pub fn target_counts(&self, counts: &BTreeMap<i64, usize>) -> BTreeMap<i64, usize> {
        let (minority, majority, _) = extremes(counts);
        let min_count = counts.values().copied().min().unwrap_or(0);

        counts
            .iter()
            .map(|(&class, &count)| {
                let selected = match self {
                    UnderSamplingStrategy::Auto | UnderSamplingStrategy::Majority => {
                        class == majority
                    }
                    UnderSamplingStrategy::NotMinority => class != minority,
                    UnderSamplingStrategy::NotMajority => class != majority,
                    UnderSamplingStrategy::All => true,
                };
                let target = if selected { min_count.min(count) } else { count };
                (class, target)
            })
            .collect()
    }
}

/// (minority class, majority class, majority count); ties broken toward the
/// lower label so strategy selection is deterministic.
fn extremes(counts: &BTreeMap<i64, usize>) -> (i64, i64, usize) {
    let mut minority = 0i64;
    let mut majority = 0i64;
    let mut min_count = usize::MAX;
    let mut max_count = 0usize;
    for (&class, &count) in counts {
        if count < min_count {
            min_count = count;
            minority = class;
        }
        if count > max_count {
            max_count = count;
            majority = class;
        }
    }
    (minority, majority, max_count)
}

/// Get class distribution, in label order.
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class.
pub fn class_indices(y: &Array1<i64>) -> HashMap<i64, Vec<usize>> {
    let mut indices = HashMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}
