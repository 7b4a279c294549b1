use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across CSV and JSON ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input does not conform to the provided schema (missing required fields/columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by dataset operations, the dispatcher and the executor.
///
/// Every variant is fatal to the pipeline run in which it occurs. The executor returns the first
/// error it encounters unmodified.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The config or an instruction has the wrong shape (not an object, no `action`, a field of
    /// the wrong JSON type, an unparsable filter expression, ...).
    #[error("config error: {message}")]
    Config { message: String },

    /// An instruction lacks a field its action requires.
    #[error("action '{action}' is missing required field '{field}'")]
    MissingField { action: String, field: String },

    /// The action is not recognized, or is not in the validation whitelist.
    #[error("unknown or disallowed action '{action}'{}", step_suffix(.step))]
    UnknownAction { action: String, step: Option<usize> },

    /// A referenced column label is absent from the current dataset.
    #[error("column '{column}' not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A rename would overwrite a different existing column.
    #[error("cannot rename '{from}' to '{to}': column '{to}' already exists")]
    ColumnConflict { from: String, to: String },

    /// A callable reference could not be resolved.
    #[error("failed to load callable {callable}: {message}")]
    Load { callable: String, message: String },

    /// A resolved callable failed, or returned a result of the wrong shape.
    #[error("execution of {callable} failed: {message}")]
    Execution { callable: String, message: String },

    /// Two shapes could not be aligned by row label.
    #[error("row alignment failed: {message}")]
    Alignment { message: String },

    /// `save` was asked to write a format other than CSV.
    #[error("unsupported output format for '{}' (only .csv is supported)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Underlying I/O error (e.g. the config file cannot be read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The config text is not valid JSON.
    #[error("failed to parse pipeline config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn missing_column(column: &str, available: Vec<String>) -> Self {
        Self::MissingColumn {
            column: column.to_owned(),
            available,
        }
    }
}

fn step_suffix(step: &Option<usize>) -> String {
    step.map(|i| format!(" at instruction {i}"))
        .unwrap_or_default()
}
