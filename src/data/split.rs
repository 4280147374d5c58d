//! Deterministic train/test partitioning
//!
//! The dashboard's only fair comparison axis is "same split, different
//! model", so the split is seeded and its proportions are constants.

use crate::data::{ClassLabels, EncodedDataset};
use crate::error::{Result, ShopsightError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fraction of rows held out for testing.
pub const TEST_FRACTION: f64 = 0.25;

/// Seed for the split shuffle.
pub const SPLIT_SEED: u64 = 1;

/// Disjoint train/test partitions of an encoded dataset.
///
/// Immutable once created; strategies resample copies of the training
/// partition and always score against the test partition as-is.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub columns: Vec<String>,
    pub classes: ClassLabels,
    pub x_train: Array2<f64>,
    pub y_train: Array1<i64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<i64>,
}

/// Shuffle-split `encoded` into train/test partitions.
pub fn train_test_split(
    encoded: &EncodedDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<SplitDataset> {
    let n_samples = encoded.features.x.nrows();
    if n_samples != encoded.labels.len() {
        return Err(ShopsightError::ShapeError {
            expected: format!("{n_samples} labels"),
            actual: format!("{} labels", encoded.labels.len()),
        });
    }
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(ShopsightError::ValidationError(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n_test = ((n_samples as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(ShopsightError::ValidationError(format!(
            "cannot split {n_samples} rows with test fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    let select = |idx: &[usize]| -> (Array2<f64>, Array1<i64>) {
        let x = encoded.features.x.select(Axis(0), idx);
        let y = Array1::from_vec(idx.iter().map(|&i| encoded.labels[i]).collect());
        (x, y)
    };

    let (x_test, y_test) = select(test_idx);
    let (x_train, y_train) = select(train_idx);

    Ok(SplitDataset {
        columns: encoded.features.columns.clone(),
        classes: encoded.classes.clone(),
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureMatrix;
    use ndarray::Array2;

    fn encoded(n: usize) -> EncodedDataset {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let labels = Array1::from_vec((0..n).map(|i| (i % 2) as i64).collect());
        EncodedDataset {
            features: FeatureMatrix {
                x,
                columns: vec!["a".to_string(), "b".to_string()],
            },
            labels,
            classes: ClassLabels::new(vec!["No Sale".to_string(), "Sale".to_string()]),
        }
    }

    #[test]
    fn test_split_is_reproducible() {
        let data = encoded(40);
        let first = train_test_split(&data, TEST_FRACTION, SPLIT_SEED).unwrap();
        let second = train_test_split(&data, TEST_FRACTION, SPLIT_SEED).unwrap();

        assert_eq!(first.x_train, second.x_train);
        assert_eq!(first.y_train, second.y_train);
        assert_eq!(first.x_test, second.x_test);
        assert_eq!(first.y_test, second.y_test);
    }

    #[test]
    fn test_split_partitions_are_disjoint_and_exhaustive() {
        let data = encoded(40);
        let split = train_test_split(&data, TEST_FRACTION, SPLIT_SEED).unwrap();

        assert_eq!(split.x_test.nrows(), 10);
        assert_eq!(split.x_train.nrows(), 30);

        // Each source row carries a unique first-column value; together the
        // partitions must cover all of them exactly once.
        let mut seen: Vec<i64> = split
            .x_train
            .column(0)
            .iter()
            .chain(split.x_test.column(0).iter())
            .map(|&v| v as i64)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).map(|i| i * 2).collect::<Vec<i64>>());
    }

    #[test]
    fn test_different_seed_changes_split() {
        let data = encoded(40);
        let a = train_test_split(&data, TEST_FRACTION, 1).unwrap();
        let b = train_test_split(&data, TEST_FRACTION, 2).unwrap();
        assert_ne!(a.y_test, b.y_test);
    }

    #[test]
    fn test_degenerate_fraction_rejected() {
        let data = encoded(8);
        assert!(train_test_split(&data, 0.0, 1).is_err());
        assert!(train_test_split(&data, 1.0, 1).is_err());
    }
}
