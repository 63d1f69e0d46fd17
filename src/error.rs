//! Error types for the oil-purity library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PurityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to load '{path}': {reason}")]
    Ingestion { path: String, reason: String },

    #[error("Invalid abundance '{value}' at row {row}, column '{column}'")]
    InvalidAbundance {
        value: String,
        row: usize,
        column: String,
    },

    #[error("Row '{row_id}' of table '{table}' has total abundance {sum}, cannot normalize")]
    DegenerateRow {
        table: String,
        row_id: String,
        sum: f64,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Zero-norm profile '{0}': cosine similarity is undefined")]
    ZeroNorm(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PurityError {
    /// Whether this error should stop a run before a report exists.
    ///
    /// Only visualization failures leave the computed report usable.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PurityError::Visualization(_))
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PurityError>;
