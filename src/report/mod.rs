//! Prediction scoring and report assembly
//!
//! Everything here is presentational data: the CLI renders it as text
//! tables, the server ships it as JSON.

use crate::data::ClassLabels;
use crate::error::{Result, ShopsightError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Mean of per-class recall.
///
/// The dataset is imbalanced, so plain accuracy rewards predicting the
/// majority class; balanced accuracy does not.
pub fn balanced_accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(ShopsightError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(ShopsightError::ValidationError(
            "cannot score an empty label vector".to_string(),
        ));
    }

    let mut classes: Vec<i64> = y_true.iter().copied().collect();
    classes.sort_unstable();
    classes.dedup();

    let mut recall_sum = 0.0;
    for &class in &classes {
        let support = y_true.iter().filter(|&&t| t == class).count();
        let hits = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(&t, &p)| t == class && p == class)
            .count();
        recall_sum += hits as f64 / support as f64;
    }

    Ok(recall_sum / classes.len() as f64)
}

/// One row of the classification report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 plus accuracy and macro/weighted averages,
/// sorted by F1 descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub rows: Vec<ReportRow>,
}

impl ClassificationReport {
    pub fn compute(
        y_true: &Array1<i64>,
        y_pred: &Array1<i64>,
        classes: &ClassLabels,
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        let total = y_true.len();
        if total == 0 {
            return Err(ShopsightError::ValidationError(
                "cannot report on an empty label vector".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(classes.len() + 3);
        let mut macro_sum = (0.0, 0.0, 0.0);
        let mut weighted_sum = (0.0, 0.0, 0.0);

        for (index, name) in classes.names().iter().enumerate() {
            let class = index as i64;
            let support = y_true.iter().filter(|&&t| t == class).count();
            let predicted = y_pred.iter().filter(|&&p| p == class).count();
            let hits = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(&t, &p)| t == class && p == class)
                .count();

            let precision = if predicted > 0 {
                hits as f64 / predicted as f64
            } else {
                0.0
            };
            let recall = if support > 0 {
                hits as f64 / support as f64
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            macro_sum.0 += precision;
            macro_sum.1 += recall;
            macro_sum.2 += f1;
            let w = support as f64 / total as f64;
            weighted_sum.0 += w * precision;
            weighted_sum.1 += w * recall;
            weighted_sum.2 += w * f1;

            rows.push(ReportRow {
                label: name.clone(),
                precision,
                recall,
                f1,
                support,
            });
        }

        let accuracy = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count() as f64
            / total as f64;

        rows.push(ReportRow {
            label: "accuracy".to_string(),
            precision: accuracy,
            recall: accuracy,
            f1: accuracy,
            support: total,
        });

        let n_classes = classes.len() as f64;
        rows.push(ReportRow {
            label: "macro avg".to_string(),
            precision: macro_sum.0 / n_classes,
            recall: macro_sum.1 / n_classes,
            f1: macro_sum.2 / n_classes,
            support: total,
        });
        rows.push(ReportRow {
            label: "weighted avg".to_string(),
            precision: weighted_sum.0,
            recall: weighted_sum.1,
            f1: weighted_sum.2,
            support: total,
        });

        rows.sort_by(|a, b| b.f1.partial_cmp(&a.f1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(Self { rows })
    }
}

/// Square count matrix; rows are true classes, columns predicted classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn compute(
        y_true: &Array1<i64>,
        y_pred: &Array1<i64>,
        classes: &ClassLabels,
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }

        let n = classes.len();
        let mut counts = vec![vec![0u64; n]; n];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let (t, p) = (t as usize, p as usize);
            if t >= n || p >= n {
                return Err(ShopsightError::ValidationError(format!(
                    "label index out of range for {n} classes"
                )));
            }
            counts[t][p] += 1;
        }

        Ok(Self {
            labels: classes.names().to_vec(),
            counts,
        })
    }

    /// Total number of scored samples
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Named per-feature scores: signed coefficients for the linear model,
/// normalized impurity importances for the forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub columns: Vec<String>,
    pub scores: Vec<f64>,
}

impl FeatureImportance {
    pub fn new(columns: &[String], scores: &Array1<f64>) -> Result<Self> {
        if columns.len() != scores.len() {
            return Err(ShopsightError::ShapeError {
                expected: format!("{} scores", columns.len()),
                actual: format!("{} scores", scores.len()),
            });
        }
        Ok(Self {
            columns: columns.to_vec(),
            scores: scores.to_vec(),
        })
    }
}

/// Symmetric Pearson correlation matrix over feature columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Pearson correlation of every column pair of `x`.
///
/// Zero-variance columns correlate 0.0 with everything except themselves.
pub fn correlation_matrix(x: &Array2<f64>, columns: &[String]) -> Result<CorrelationMatrix> {
    let n_cols = x.ncols();
    if n_cols != columns.len() {
        return Err(ShopsightError::ShapeError {
            expected: format!("{} columns", columns.len()),
            actual: format!("{n_cols} columns"),
        });
    }
    let n = x.nrows();
    if n == 0 {
        return Err(ShopsightError::ValidationError(
            "cannot correlate an empty matrix".to_string(),
        ));
    }

    let means: Vec<f64> = (0..n_cols)
        .map(|j| x.column(j).sum() / n as f64)
        .collect();
    let stds: Vec<f64> = (0..n_cols)
        .map(|j| {
            let m = means[j];
            (x.column(j).iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / n as f64).sqrt()
        })
        .collect();

    let mut values = vec![vec![0.0; n_cols]; n_cols];
    for i in 0..n_cols {
        values[i][i] = 1.0;
        for j in (i + 1)..n_cols {
            let r = if stds[i] > 0.0 && stds[j] > 0.0 {
                let cov = x
                    .column(i)
                    .iter()
                    .zip(x.column(j).iter())
                    .map(|(&a, &b)| (a - means[i]) * (b - means[j]))
                    .sum::<f64>()
                    / n as f64;
                cov / (stds[i] * stds[j])
            } else {
                0.0
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}
