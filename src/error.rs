//! Error types for shopsight

use thiserror::Error;

/// Result type alias for shopsight operations
pub type Result<T> = std::result::Result<T, ShopsightError>;

/// Main error type for the shopsight crate
#[derive(Error, Debug)]
pub enum ShopsightError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Resampling error: {0}")]
    ResamplingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for ShopsightError {
    fn from(err: polars::error::PolarsError) -> Self {
        ShopsightError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ShopsightError {
    fn from(err: serde_json::Error) -> Self {
        ShopsightError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ShopsightError {
    fn from(err: ndarray::ShapeError) -> Self {
        ShopsightError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShopsightError::DataError("bad row".to_string());
        assert_eq!(err.to_string(), "Data error: bad row");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShopsightError = io_err.into();
        assert!(matches!(err, ShopsightError::IoError(_)));
    }
}
