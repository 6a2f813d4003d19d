//! Error types for the house price estimator

use thiserror::Error;

/// Startup-time schema violations. All of these are fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("column `{0}` is declared in the feature schema but missing from the dataset")]
    MissingColumn(String),

    #[error("dataset column `{0}` is not assigned to any schema role")]
    UnclassifiedColumn(String),

    #[error("column `{0}` appears in more than one schema role")]
    DuplicateColumn(String),

    #[error("schema declares no target column")]
    EmptyTarget,

    #[error("row {row}: target value `{value}` is not numeric")]
    NonNumericTarget { row: usize, value: String },

    #[error("row {row}: value `{value}` in numerical column `{column}` is not numeric")]
    NonNumericFeature {
        column: String,
        row: usize,
        value: String,
    },

    #[error("adjustment column `{0}` must be one of the categorical columns")]
    InvalidAdjustmentColumn(String),
}

/// Errors that can occur while loading, training or predicting.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("dataset error: {0}")]
    Dataset(String),

    /// A prediction record is missing a field or carries the wrong kind of value.
    #[error("invalid input record: {0}")]
    InputShape(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("pipeline was fitted on dataset {expected}, refusing dataset {actual}")]
    DatasetMismatch { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for estimator operations
pub type Result<T> = std::result::Result<T, EstimatorError>;
