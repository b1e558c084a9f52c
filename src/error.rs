//! Error types for each pipeline stage.
//!
//! Every stage either returns a complete result or fails with one of these
//! errors; there is no partial-result path. The binary decides how to log and
//! exit.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failures while reading a dataset or validating its declared column types.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file format: '{0}'. Supported formats: csv, txt, parquet")]
    UnsupportedFormat(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Declared column '{0}' is not present in the dataset")]
    MissingColumn(String),

    #[error("Column '{column}' has type {actual} and cannot be declared {expected}")]
    WrongType {
        column: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Column '{column}' is declared as a date but row {row} holds '{value}'")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' is declared as numeric but row {row} holds '{value}'")]
    NumberParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Precondition failures: an operation was handed data it cannot work on.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Column '{column}' has type {actual}, expected {expected}")]
    WrongType {
        column: String,
        expected: &'static str,
        actual: String,
    },

    #[error("No rows left to {0}")]
    Empty(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Failures while fitting or scoring one model. Always names the model.
#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("{model}: training set is empty")]
    EmptyTrainingSet { model: String },

    #[error("{model}: {rows} feature rows but {targets} targets")]
    LengthMismatch {
        model: String,
        rows: usize,
        targets: usize,
    },

    #[error("{model}: expected {expected} features, got {got}")]
    FeatureMismatch {
        model: String,
        expected: usize,
        got: usize,
    },

    #[error("{model}: non-finite value in training data")]
    NonFinite { model: String },

    #[error("{model}: normal equations are singular")]
    Singular { model: String },

    #[error("{model}: model has not been fitted")]
    NotFitted { model: String },
}

impl TrainingError {
    /// Name of the model that failed.
    pub fn model(&self) -> &str {
        match self {
            TrainingError::EmptyTrainingSet { model }
            | TrainingError::LengthMismatch { model, .. }
            | TrainingError::FeatureMismatch { model, .. }
            | TrainingError::NonFinite { model }
            | TrainingError::Singular { model }
            | TrainingError::NotFitted { model } => model,
        }
    }
}

/// Failures while rendering a chart. Names the chart and, where relevant, the column.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("{chart} chart: column '{column}' not found")]
    MissingColumn { chart: String, column: String },

    #[error("{chart} chart: column '{column}' has no plottable values")]
    EmptyData { chart: String, column: String },

    #[error("{chart} chart: {source}")]
    Data {
        chart: String,
        #[source]
        source: DataError,
    },

    #[error("{chart} chart: failed to render: {reason}")]
    Render { chart: String, reason: String },
}
