//! Error types for the sheetlake library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sheetlake operations.
#[derive(Debug, Error)]
pub enum SheetlakeError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or its first sheet read.
    #[error("Workbook error for '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// YAML document could not be parsed.
    #[error("YAML error in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Configuration error. Always fatal for a run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No classified files exist for a schema.
    #[error("No classified files for label '{label}' schema '{schema_hash}' in '{dir}'")]
    NotFound {
        label: String,
        schema_hash: String,
        dir: PathBuf,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A table transform rejected its input.
    #[error("Transform failed for label '{label}': {message}")]
    Transform { label: String, message: String },

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl SheetlakeError {
    /// Build an `Io` error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SheetlakeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for sheetlake operations.
pub type Result<T> = std::result::Result<T, SheetlakeError>;
