//! shopsight CLI
//!
//! Command-line interface for running classification experiments against
//! the shoppers dataset.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::data::{encode, load_dataset, train_test_split, SplitDataset};
use crate::data::{DEFAULT_DATASET_PATH, SPLIT_SEED, TEST_FRACTION};
use crate::experiment::{
    default_strategies, run_experiment, BalancedForestParams, EasyEnsembleParams,
    ExperimentReport, LinearOversampledParams, Strategy,
};
use crate::model::MaxFeaturesRule;
use crate::resample::{OverSamplingStrategy, UnderSamplingStrategy};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "shopsight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare imbalanced-classification strategies for purchase prediction")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one strategy and print its full report
    Run {
        /// Dataset file (defaults to the shoppers CSV in the working directory)
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[command(subcommand)]
        strategy: StrategyCommand,
    },

    /// Run all three strategies at defaults on the same split
    Compare {
        /// Dataset file
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Show dataset information
    Info {
        /// Dataset file
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Start the web server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Dataset file
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum StrategyCommand {
    /// SMOTE oversampling + logistic regression
    LinearOversampled {
        /// Which classes to oversample
        #[arg(long, value_enum, default_value = "auto")]
        sampling_strategy: OverSamplingStrategy,

        /// Random state seed
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=100))]
        seed: u64,
    },

    /// Balanced random forest
    BalancedForest {
        /// Features considered per split
        #[arg(long, value_enum, default_value = "auto")]
        max_features: MaxFeaturesRule,

        /// Number of trees
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=100))]
        estimators: u64,

        /// Random state seed
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=100))]
        seed: u64,
    },

    /// Easy-ensemble boosting
    EasyEnsemble {
        /// Which classes to undersample per bag
        #[arg(long, value_enum, default_value = "auto")]
        sampling_strategy: UnderSamplingStrategy,

        /// Number of bags
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=100))]
        estimators: u64,

        /// Random state seed
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=100))]
        seed: u64,
    },
}

impl StrategyCommand {
    pub fn into_strategy(self) -> Strategy {
        match self {
            StrategyCommand::LinearOversampled {
                sampling_strategy,
                seed,
            } => Strategy::LinearOversampled(LinearOversampledParams {
                sampling_strategy,
                random_seed: seed,
            }),
            StrategyCommand::BalancedForest {
                max_features,
                estimators,
                seed,
            } => Strategy::BalancedForest(BalancedForestParams {
                max_features_rule: max_features,
                estimator_count: estimators as usize,
                random_seed: seed,
            }),
            StrategyCommand::EasyEnsemble {
                sampling_strategy,
                estimators,
                seed,
            } => Strategy::EasyEnsembleBoost(EasyEnsembleParams {
                sampling_strategy,
                estimator_count: estimators as usize,
                random_seed: seed,
            }),
        }
    }
}

fn dataset_path(data: Option<PathBuf>) -> PathBuf {
    data.unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH))
}

/// Load, encode and split once; every command starts here.
pub fn prepare_split(data: Option<PathBuf>) -> anyhow::Result<SplitDataset> {
    let path = dataset_path(data);
    let loaded = load_dataset(&path)?;
    let encoded = encode(&loaded)?;
    Ok(train_test_split(&encoded, TEST_FRACTION, SPLIT_SEED)?)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(data: Option<PathBuf>, strategy: StrategyCommand) -> anyhow::Result<()> {
    let split = prepare_split(data)?;
    let strategy = strategy.into_strategy();
    let report = run_experiment(&split, &strategy)?;
    print_report(&report);
    Ok(())
}

pub fn cmd_compare(data: Option<PathBuf>) -> anyhow::Result<()> {
    let split = prepare_split(data)?;

    section("Compare");
    println!(
        "  {:<28} {:>18} {:>10}",
        muted("Strategy"),
        muted("Balanced Accuracy"),
        muted("Time")
    );
    println!("  {}", dim(&"─".repeat(58)));

    let mut results: Vec<(String, f64)> = Vec::new();
    for strategy in default_strategies() {
        match run_experiment(&split, &strategy) {
            Ok(report) => {
                println!(
                    "  {:<28} {:>18.4} {:>9.2}s",
                    report.strategy, report.balanced_accuracy, report.fit_seconds
                );
                results.push((report.strategy, report.balanced_accuracy));
            }
            Err(e) => {
                println!("  {:<28} {:>18}", strategy.name(), format!("err: {e}").red());
            }
        }
    }
    println!("  {}", dim(&"─".repeat(58)));

    if let Some((name, score)) = results
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        println!();
        println!(
            "  {} {} {} {:.4}",
            ok("best"),
            name.white().bold(),
            muted("balanced accuracy:"),
            score
        );
    }

    println!();
    Ok(())
}

pub fn cmd_info(data: Option<PathBuf>) -> anyhow::Result<()> {
    let path = dataset_path(data);
    let loaded = load_dataset(&path)?;
    let summary = loaded.summary()?;

    section("Dataset");
    println!("  {:<12} {}", muted("File"), path.display());
    println!("  {:<12} {}", muted("Rows"), summary.rows);
    println!("  {:<12} {}", muted("Columns"), summary.columns);
    for (label, count) in &summary.class_counts {
        println!("  {:<12} {}", muted(label), count);
    }

    println!();
    println!(
        "  {:<28} {:<12} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(58)));
    for col in loaded.frame.get_columns() {
        println!(
            "  {:<28} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

// ─── Report rendering ──────────────────────────────────────────────────────────

fn print_report(report: &ExperimentReport) {
    section(&report.strategy);

    println!(
        "  {:<16} {} × {}",
        muted("Train shape"),
        report.train_shape.rows,
        report.train_shape.columns
    );
    if let Some(shape) = &report.resampled_shape {
        println!(
            "  {:<16} {} × {}",
            muted("Resampled"),
            shape.rows,
            shape.columns
        );
    }
    println!(
        "  {:<16} {} × {}",
        muted("Test shape"),
        report.test_shape.rows,
        report.test_shape.columns
    );
    println!(
        "  {:<16} {}",
        muted("Fit time"),
        format!("{:.3}s", report.fit_seconds)
    );
    println!();
    println!(
        "  {:<16} {}",
        muted("Balanced Acc"),
        format!("{:.4}", report.balanced_accuracy).white().bold()
    );

    section("Classification Report");
    println!(
        "  {:<16} {:>10} {:>10} {:>10} {:>9}",
        muted("label"),
        muted("precision"),
        muted("recall"),
        muted("f1"),
        muted("support")
    );
    println!("  {}", dim(&"─".repeat(58)));
    for row in &report.classification.rows {
        println!(
            "  {:<16} {:>10.4} {:>10.4} {:>10.4} {:>9}",
            row.label, row.precision, row.recall, row.f1, row.support
        );
    }

    section("Confusion Matrix");
    let width = report
        .confusion
        .labels
        .iter()
        .map(|l| l.len())
        .max()
        .unwrap_or(8)
        .max(8);
    print!("  {:<w$}", "", w = width + 2);
    for label in &report.confusion.labels {
        print!(" {:>w$}", label, w = width);
    }
    println!();
    for (label, row) in report.confusion.labels.iter().zip(&report.confusion.counts) {
        print!("  {:<w$}", label, w = width + 2);
        for count in row {
            print!(" {:>w$}", count, w = width);
        }
        println!();
    }

    if let Some(importance) = &report.feature_importance {
        section("Feature Importance");
        let mut ranked: Vec<(&String, f64)> = importance
            .columns
            .iter()
            .zip(importance.scores.iter().copied())
            .collect();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (name, score) in ranked {
            println!("  {:<36} {:>10.4}", name, score);
        }
    }

    section("Strongest Correlations");
    let corr = &report.correlation;
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..corr.columns.len() {
        for j in (i + 1)..corr.columns.len() {
            pairs.push((i, j, corr.values[i][j]));
        }
    }
    pairs.sort_by(|a, b| {
        b.2.abs()
            .partial_cmp(&a.2.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, j, r) in pairs.into_iter().take(10) {
        println!(
            "  {:<24} {:<24} {:>8.4}",
            corr.columns[i], corr.columns[j], r
        );
    }

    println!();
}
