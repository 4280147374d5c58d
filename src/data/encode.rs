//! One-hot feature encoding
//!
//! Expands string columns into indicator columns, maps booleans to 0/1 and
//! casts the rest to f64. Column ordering is stable: source columns keep
//! their frame order and categories within a column are sorted, so encoding
//! the same frame twice always yields the same layout.

use crate::data::{ShopperData, LABEL_COLUMN};
use crate::error::{Result, ShopsightError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric feature view of the dataset with named columns.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub x: Array2<f64>,
    pub columns: Vec<String>,
}

/// Ordered class label names; the label vector stores indices into this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Build from arbitrary names; stored sorted and deduplicated so label
    /// indices are stable regardless of input order.
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<i64> {
        self.names.iter().position(|n| n == name).map(|i| i as i64)
    }

    pub fn name_of(&self, index: i64) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }
}

/// Encoded features, labels and the class mapping for one dataset.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub features: FeatureMatrix,
    pub labels: Array1<i64>,
    pub classes: ClassLabels,
}

/// One-hot encode the feature columns and index-encode the label column.
pub fn encode(data: &ShopperData) -> Result<EncodedDataset> {
    let frame = &data.frame;
    let n_rows = frame.height();

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for column in frame.get_columns() {
        let name = column.name().as_str();
        if name == LABEL_COLUMN {
            continue;
        }
        let series = column.as_materialized_series();

        match series.dtype() {
            DataType::Boolean => {
                let values = series
                    .bool()
                    .map_err(|e| ShopsightError::EncodingError(e.to_string()))?
                    .into_iter()
                    .map(|v| {
                        v.map(|b| if b { 1.0 } else { 0.0 }).ok_or_else(|| {
                            ShopsightError::EncodingError(format!("null in column {name}"))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                names.push(name.to_string());
                columns.push(values);
            }
            DataType::String => {
                let ca = series
                    .str()
                    .map_err(|e| ShopsightError::EncodingError(e.to_string()))?;

                let categories: BTreeSet<&str> = ca.into_iter().flatten().collect();
                if ca.null_count() > 0 {
                    return Err(ShopsightError::EncodingError(format!(
                        "null in column {name}"
                    )));
                }

                for category in categories {
                    let values: Vec<f64> = ca
                        .into_iter()
                        .map(|v| if v == Some(category) { 1.0 } else { 0.0 })
                        .collect();
                    names.push(format!("{name}_{category}"));
                    columns.push(values);
                }
            }
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {
                let cast = series
                    .cast(&DataType::Float64)
                    .map_err(|e| ShopsightError::EncodingError(e.to_string()))?;
                let values = cast
                    .f64()
                    .map_err(|e| ShopsightError::EncodingError(e.to_string()))?
                    .into_iter()
                    .map(|v| {
                        v.ok_or_else(|| {
                            ShopsightError::EncodingError(format!("null in column {name}"))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                names.push(name.to_string());
                columns.push(values);
            }
            other => {
                return Err(ShopsightError::EncodingError(format!(
                    "column {name} has unsupported dtype {other:?}"
                )))
            }
        }
    }

    if names.is_empty() {
        return Err(ShopsightError::EncodingError(
            "no feature columns besides the label".to_string(),
        ));
    }

    let x = Array2::from_shape_fn((n_rows, names.len()), |(i, j)| columns[j][i]);

    let (labels, classes) = encode_labels(frame)?;

    Ok(EncodedDataset {
        features: FeatureMatrix { x, columns: names },
        labels,
        classes,
    })
}

fn encode_labels(frame: &DataFrame) -> Result<(Array1<i64>, ClassLabels)> {
    let series = frame
        .column(LABEL_COLUMN)
        .map_err(|_| ShopsightError::ColumnNotFound(LABEL_COLUMN.to_string()))?
        .as_materialized_series()
        .clone();

    let ca = series
        .str()
        .map_err(|e| ShopsightError::EncodingError(e.to_string()))?;

    let unique: BTreeSet<&str> = ca.into_iter().flatten().collect();
    let classes = ClassLabels::new(unique.into_iter().map(String::from).collect());

    let labels = ca
        .into_iter()
        .map(|v| {
            v.and_then(|s| classes.index_of(s)).ok_or_else(|| {
                ShopsightError::EncodingError(format!("null label in column {LABEL_COLUMN}"))
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    Ok((Array1::from_vec(labels), classes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> ShopperData {
        let frame = df!(
            "PageValues" => &[0.0, 5.2, 1.1, 9.9],
            "Month" => &["Feb", "Mar", "Feb", "May"],
            "Weekend" => &[false, true, false, true],
            "Revenue" => &["No Sale", "Sale", "No Sale", "Sale"]
        )
        .unwrap();
        ShopperData { frame }
    }

    #[test]
    fn test_encode_column_layout() {
        let encoded = encode(&sample_data()).unwrap();

        assert_eq!(
            encoded.features.columns,
            vec!["PageValues", "Month_Feb", "Month_Mar", "Month_May", "Weekend"]
        );
        assert_eq!(encoded.features.x.nrows(), 4);
        assert_eq!(encoded.features.x.ncols(), 5);

        // Row 1: Month=Mar, Weekend=true
        assert_eq!(encoded.features.x[[1, 1]], 0.0);
        assert_eq!(encoded.features.x[[1, 2]], 1.0);
        assert_eq!(encoded.features.x[[1, 4]], 1.0);
    }

    #[test]
    fn test_encode_is_stable() {
        let data = sample_data();
        let first = encode(&data).unwrap();
        let second = encode(&data).unwrap();
        assert_eq!(first.features.columns, second.features.columns);
        assert_eq!(first.features.x, second.features.x);
    }

    #[test]
    fn test_label_indices_follow_sorted_names() {
        let encoded = encode(&sample_data()).unwrap();
        // "No Sale" sorts before "Sale"
        let names: Vec<&str> = encoded.classes.names().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["No Sale", "Sale"]);
        assert_eq!(encoded.labels.to_vec(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_missing_label_column() {
        let frame = df!("PageValues" => &[1.0, 2.0]).unwrap();
        let err = encode(&ShopperData { frame }).unwrap_err();
        assert!(matches!(err, ShopsightError::ColumnNotFound(_)));
    }
}
