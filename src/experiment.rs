//! Experiment configuration and dispatch
//!
//! The dashboard's whole job reduces to one pure function: take a strategy
//! with its parameters, fit on the (possibly rebalanced) training partition,
//! predict on the fixed test partition, and assemble a report. The split is
//! borrowed immutably, so no run can leak state into the next one.

use crate::data::SplitDataset;
use crate::error::Result;
use crate::model::{BalancedRandomForest, EasyEnsemble, LogisticRegression, MaxFeaturesRule};
use crate::report::{
    balanced_accuracy, correlation_matrix, ClassificationReport, ConfusionMatrix,
    CorrelationMatrix, FeatureImportance,
};
use crate::resample::{OverSamplingStrategy, Sampler, Smote, UnderSamplingStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Parameters of the SMOTE + logistic regression strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearOversampledParams {
    pub sampling_strategy: OverSamplingStrategy,
    pub random_seed: u64,
}

/// Parameters of the balanced random forest strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancedForestParams {
    pub max_features_rule: MaxFeaturesRule,
    pub estimator_count: usize,
    pub random_seed: u64,
}

/// Parameters of the easy-ensemble boosting strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasyEnsembleParams {
    pub sampling_strategy: UnderSamplingStrategy,
    pub estimator_count: usize,
    pub random_seed: u64,
}

/// One of the three classification strategies with its typed parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "params", rename_all = "kebab-case")]
pub enum Strategy {
    LinearOversampled(LinearOversampledParams),
    BalancedForest(BalancedForestParams),
    EasyEnsembleBoost(EasyEnsembleParams),
}

impl Strategy {
    /// Human-readable strategy name
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::LinearOversampled(_) => "SMOTE + Logistic Regression",
            Strategy::BalancedForest(_) => "Balanced Random Forest",
            Strategy::EasyEnsembleBoost(_) => "Easy Ensemble Boosting",
        }
    }
}

/// Row/column counts of a matrix as shown on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShapeInfo {
    pub rows: usize,
    pub columns: usize,
}

/// Everything one experiment run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub strategy: String,
    pub generated_at: DateTime<Utc>,
    pub train_shape: ShapeInfo,
    pub test_shape: ShapeInfo,
    /// Post-oversampling training shape; only set when resampling ran
    pub resampled_shape: Option<ShapeInfo>,
    pub balanced_accuracy: f64,
    pub classification: ClassificationReport,
    pub confusion: ConfusionMatrix,
    /// Absent for the boosting strategy
    pub feature_importance: Option<FeatureImportance>,
    pub correlation: CorrelationMatrix,
    pub fit_seconds: f64,
}

/// Run one strategy against a fixed split and assemble its report.
pub fn run_experiment(data: &SplitDataset, strategy: &Strategy) -> Result<ExperimentReport> {
    info!(strategy = strategy.name(), "running experiment");
    let start = Instant::now();

    let (predictions, resampled_shape, feature_importance, correlation) = match strategy {
        Strategy::LinearOversampled(params) => {
            let mut smote = Smote::new(params.sampling_strategy, params.random_seed);
            let resampled = smote.fit_resample(&data.x_train, &data.y_train)?;

            let mut model = LogisticRegression::new();
            model.fit(&resampled.x, &resampled.y)?;
            let predictions = model.predict(&data.x_test)?;

            let importance = model
                .coefficients()
                .map(|coefs| FeatureImportance::new(&data.columns, coefs))
                .transpose()?;
            // The linear model saw the resampled matrix, so correlate that.
            let correlation = correlation_matrix(&resampled.x, &data.columns)?;

            let shape = ShapeInfo {
                rows: resampled.x.nrows(),
                columns: resampled.x.ncols(),
            };
            (predictions, Some(shape), importance, correlation)
        }
        Strategy::BalancedForest(params) => {
            let mut model = BalancedRandomForest::new(params.estimator_count, params.random_seed)
                .with_max_features(params.max_features_rule);
            model.fit(&data.x_train, &data.y_train)?;
            let predictions = model.predict(&data.x_test)?;

            let importance = model
                .feature_importances()
                .map(|imp| FeatureImportance::new(&data.columns, imp))
                .transpose()?;
            let correlation = correlation_matrix(&data.x_train, &data.columns)?;

            (predictions, None, importance, correlation)
        }
        Strategy::EasyEnsembleBoost(params) => {
            let mut model = EasyEnsemble::new(
                params.estimator_count,
                params.sampling_strategy,
                params.random_seed,
            );
            model.fit(&data.x_train, &data.y_train)?;
            let predictions = model.predict(&data.x_test)?;

            let correlation = correlation_matrix(&data.x_train, &data.columns)?;

            (predictions, None, None, correlation)
        }
    };

    let fit_seconds = start.elapsed().as_secs_f64();

    let score = balanced_accuracy(&data.y_test, &predictions)?;
    let classification = ClassificationReport::compute(&data.y_test, &predictions, &data.classes)?;
    let confusion = ConfusionMatrix::compute(&data.y_test, &predictions, &data.classes)?;

    info!(
        strategy = strategy.name(),
        balanced_accuracy = score,
        elapsed_secs = fit_seconds,
        "experiment finished"
    );

    Ok(ExperimentReport {
        strategy: strategy.name().to_string(),
        generated_at: Utc::now(),
        train_shape: ShapeInfo {
            rows: data.x_train.nrows(),
            columns: data.x_train.ncols(),
        },
        test_shape: ShapeInfo {
            rows: data.x_test.nrows(),
            columns: data.x_test.ncols(),
        },
        resampled_shape,
        balanced_accuracy: score,
        classification,
        confusion,
        feature_importance,
        correlation,
        fit_seconds,
    })
}

/// Default configuration of every strategy, for side-by-side comparison.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::LinearOversampled(LinearOversampledParams {
            sampling_strategy: OverSamplingStrategy::Auto,
            random_seed: 1,
        }),
        Strategy::BalancedForest(BalancedForestParams {
            max_features_rule: MaxFeaturesRule::Auto,
            estimator_count: 10,
            random_seed: 1,
        }),
        Strategy::EasyEnsembleBoost(EasyEnsembleParams {
            sampling_strategy: UnderSamplingStrategy::Auto,
            estimator_count: 10,
            random_seed: 1,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{encode, train_test_split, ShopperData};
    use polars::prelude::*;

    fn split_fixture() -> SplitDataset {
        // 32 majority / 8 minority rows with a separable numeric signal.
        let n = 40;
        let page_values: Vec<f64> = (0..n)
            .map(|i| if i % 5 == 0 { 20.0 + (i % 7) as f64 } else { (i % 7) as f64 })
            .collect();
        let duration: Vec<f64> = (0..n).map(|i| (i % 11) as f64).collect();
        let month: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Feb" } else { "May" }).collect();
        let revenue: Vec<&str> = (0..n)
            .map(|i| if i % 5 == 0 { "Sale" } else { "No Sale" })
            .collect();

        let frame = df!(
            "PageValues" => &page_values,
            "Duration" => &duration,
            "Month" => &month,
            "Revenue" => &revenue
        )
        .unwrap();

        let encoded = encode(&ShopperData { frame }).unwrap();
        train_test_split(&encoded, 0.25, 1).unwrap()
    }

    #[test]
    fn test_linear_oversampled_report() {
        let split = split_fixture();
        let strategy = Strategy::LinearOversampled(LinearOversampledParams {
            sampling_strategy: OverSamplingStrategy::Auto,
            random_seed: 1,
        });

        let report = run_experiment(&split, &strategy).unwrap();

        assert!((0.0..=1.0).contains(&report.balanced_accuracy));
        assert!(report.resampled_shape.is_some());
        // Auto oversampling balances classes, so the resampled set is larger.
        assert!(report.resampled_shape.unwrap().rows > report.train_shape.rows);
        assert!(report.feature_importance.is_some());
        assert_eq!(report.confusion.total() as usize, report.test_shape.rows);
    }

    #[test]
    fn test_forest_importances_cover_all_columns() {
        let split = split_fixture();
        let strategy = Strategy::BalancedForest(BalancedForestParams {
            max_features_rule: MaxFeaturesRule::Sqrt,
            estimator_count: 10,
            random_seed: 1,
        });

        let report = run_experiment(&split, &strategy).unwrap();

        let importance = report.feature_importance.unwrap();
        assert_eq!(importance.columns.len(), split.columns.len());
        assert!(importance.scores.iter().all(|&v| v >= 0.0));
        assert!((importance.scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_boosting_has_no_importances() {
        let split = split_fixture();
        let strategy = Strategy::EasyEnsembleBoost(EasyEnsembleParams {
            sampling_strategy: UnderSamplingStrategy::Auto,
            estimator_count: 4,
            random_seed: 1,
        });

        let report = run_experiment(&split, &strategy).unwrap();
        assert!(report.feature_importance.is_none());
        assert!(report.resampled_shape.is_none());
    }

    #[test]
    fn test_dispatch_never_mutates_the_split() {
        let split = split_fixture();
        let x_test_before = split.x_test.clone();
        let y_test_before = split.y_test.clone();
        let x_train_before = split.x_train.clone();

        for strategy in default_strategies() {
            run_experiment(&split, &strategy).unwrap();
        }

        assert_eq!(split.x_test, x_test_before);
        assert_eq!(split.y_test, y_test_before);
        assert_eq!(split.x_train, x_train_before);
    }

    #[test]
    fn test_strategy_json_round_trip() {
        let strategy = Strategy::BalancedForest(BalancedForestParams {
            max_features_rule: MaxFeaturesRule::Log2,
            estimator_count: 25,
            random_seed: 7,
        });

        let json = serde_json::to_string(&strategy).unwrap();
        assert!(json.contains("balanced-forest"));

        let back: Strategy = serde_json::from_str(&json).unwrap();
        match back {
            Strategy::BalancedForest(params) => {
                assert_eq!(params.estimator_count, 25);
                assert_eq!(params.random_seed, 7);
                assert_eq!(params.max_features_rule, MaxFeaturesRule::Log2);
            }
            other => panic!("wrong variant after round trip: {other:?}"),
        }
    }
}
