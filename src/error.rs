//! Error types for the moirai-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while producing a forecast.
///
/// All of them are surfaced to the caller of the prediction method that
/// triggered them; nothing is retried or recovered inside the aggregator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// The input structure is ambiguous or invalid (e.g. no unique value column).
    #[error("invalid input shape: {0}")]
    InputShape(String),

    /// The series is shorter than the minimum context the model needs.
    #[error("insufficient history: need at least {needed}, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// The external model failed. Fatal for the call.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A quantile level could neither be served nor interpolated.
    #[error("unsupported quantile level: {level}")]
    UnsupportedQuantile { level: f64 },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,
}
