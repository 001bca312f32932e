//! Error types for the regression benchmark

use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the benchmark harness
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Target column '{column}' is not numeric: row {row} has value {value:?}")]
    TargetConversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Feature column '{column}' is not numeric: {reason}")]
    NonNumericFeature { column: String, reason: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No model trained successfully ({attempted} attempted)")]
    NoModelsSucceeded { attempted: usize },
}

impl BenchError {
    /// Whether this error belongs to the fatal input class that aborts a run
    /// before any model is trained.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BenchError::ShapeMismatch { .. }
                | BenchError::TargetConversion { .. }
                | BenchError::NonNumericFeature { .. }
                | BenchError::FeatureNotFound(_)
                | BenchError::DataError(_)
                | BenchError::InvalidParameter { .. }
                | BenchError::ConfigError(_)
        )
    }

    pub(crate) fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        BenchError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for BenchError {
    fn from(err: polars::error::PolarsError) -> Self {
        BenchError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for BenchError {
    fn from(err: csv::Error) -> Self {
        BenchError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BenchError {
    fn from(err: ndarray::ShapeError) -> Self {
        BenchError::ShapeMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
