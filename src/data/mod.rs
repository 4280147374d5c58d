//! Dataset loading and label normalization
//!
//! The online shoppers dataset ships with a boolean `Revenue` column; the
//! rest of the pipeline works with the two categorical outcomes "Sale" and
//! "No Sale" instead.

mod encode;
mod split;

pub use encode::{encode, ClassLabels, EncodedDataset, FeatureMatrix};
pub use split::{train_test_split, SplitDataset, SPLIT_SEED, TEST_FRACTION};

use crate::error::{Result, ShopsightError};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Default location of the shoppers dataset, relative to the working directory.
pub const DEFAULT_DATASET_PATH: &str = "online_shoppers_intention.csv";

/// Name of the binary outcome column.
pub const LABEL_COLUMN: &str = "Revenue";

/// Outcome label for a completed purchase.
pub const POSITIVE_LABEL: &str = "Sale";

/// Outcome label for a session without a purchase.
pub const NEGATIVE_LABEL: &str = "No Sale";

/// A loaded shoppers dataset with the label column normalized to
/// [`POSITIVE_LABEL`] / [`NEGATIVE_LABEL`].
#[derive(Debug, Clone)]
pub struct ShopperData {
    pub frame: DataFrame,
}

/// Shape and class balance of a loaded dataset.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub class_counts: Vec<(String, usize)>,
}

/// Load the dataset from `path` and normalize the label column.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<ShopperData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ShopsightError::DataError(format!("cannot open {}: {e}", path.display()))
    })?;

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| ShopsightError::DataError(format!("cannot parse {}: {e}", path.display())))?;

    normalize_label(&mut frame)?;
    Ok(ShopperData { frame })
}

/// Rewrite the boolean-like label column as the two outcome strings.
///
/// Accepts a boolean column or a string column containing true/false in any
/// letter case. Anything else is malformed input.
fn normalize_label(frame: &mut DataFrame) -> Result<()> {
    let series = frame
        .column(LABEL_COLUMN)
        .map_err(|_| ShopsightError::ColumnNotFound(LABEL_COLUMN.to_string()))?
        .as_materialized_series()
        .clone();

    let labels: Vec<&str> = match series.dtype() {
        DataType::Boolean => series
            .bool()
            .map_err(|e| ShopsightError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| match v {
                Some(true) => Ok(POSITIVE_LABEL),
                Some(false) => Ok(NEGATIVE_LABEL),
                None => Err(ShopsightError::DataError(format!(
                    "null value in label column {LABEL_COLUMN}"
                ))),
            })
            .collect::<Result<_>>()?,
        DataType::String => series
            .str()
            .map_err(|e| ShopsightError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| match v.map(|s| s.to_ascii_lowercase()).as_deref() {
                Some("true") => Ok(POSITIVE_LABEL),
                Some("false") => Ok(NEGATIVE_LABEL),
                other => Err(ShopsightError::DataError(format!(
                    "unexpected label value {other:?} in column {LABEL_COLUMN}"
                ))),
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(ShopsightError::DataError(format!(
                "label column {LABEL_COLUMN} has unsupported dtype {other:?}"
            )))
        }
    };

    let normalized = Series::new(LABEL_COLUMN.into(), labels);
    frame
        .replace(LABEL_COLUMN, normalized)
        .map_err(|e| ShopsightError::DataError(e.to_string()))?;
    Ok(())
}

impl ShopperData {
    /// Shape counts and class balance for display surfaces.
    pub fn summary(&self) -> Result<DatasetSummary> {
        let series = self
            .frame
            .column(LABEL_COLUMN)
            .map_err(|_| ShopsightError::ColumnNotFound(LABEL_COLUMN.to_string()))?
            .as_materialized_series()
            .clone();

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in series
            .str()
            .map_err(|e| ShopsightError::DataError(e.to_string()))?
            .into_iter()
            .flatten()
        {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        Ok(DatasetSummary {
            rows: self.frame.height(),
            columns: self.frame.width(),
            class_counts: counts.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "PageValues,Month,Weekend,Revenue").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_normalizes_boolean_label() {
        let file = write_csv(&[
            "0.0,Feb,false,false",
            "5.2,Feb,true,true",
            "1.1,Mar,false,false",
        ]);
        let data = load_dataset(file.path()).unwrap();

        let labels: Vec<String> = data
            .frame
            .column(LABEL_COLUMN)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();

        assert_eq!(labels, vec!["No Sale", "Sale", "No Sale"]);
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let err = load_dataset("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ShopsightError::DataError(_)));
    }

    #[test]
    fn test_summary_counts_classes() {
        let file = write_csv(&[
            "0.0,Feb,false,false",
            "5.2,Feb,true,true",
            "1.1,Mar,false,false",
            "9.9,May,true,true",
            "0.3,May,false,false",
        ]);
        let data = load_dataset(file.path()).unwrap();
        let summary = data.summary().unwrap();

        assert_eq!(summary.rows, 5);
        assert_eq!(summary.columns, 4);
        assert_eq!(
            summary.class_counts,
            vec![("No Sale".to_string(), 3), ("Sale".to_string(), 2)]
        );
    }
}
