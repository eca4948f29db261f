use thiserror::Error;

/// Core error type shared by every gradlearn crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LearnError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Insufficient data: need at least {needed} values, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Zero variance: cannot standardize a constant sequence")]
    ZeroVariance,

    #[error("Degenerate dataset: {0}")]
    DegenerateDataset(String),

    #[error("Invalid label {label} at index {index}: {expected}")]
    InvalidLabel {
        index: usize,
        label: f64,
        expected: &'static str,
    },

    #[error("Result at index {0} has no prediction; apply a threshold first")]
    MissingPrediction(usize),

    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type LearnResult<T> = Result<T, LearnError>;
