//! Error types for the cleaning and feature preparation stages.

use serde::Serialize;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for pipeline operations.
///
/// Every variant is fatal: the stage that raised it aborts and no partial
/// frame is returned.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    /// Shorthand for a missing-column schema error.
    pub fn missing_column(column: &str) -> Self {
        PipelineError::Schema(format!("Missing required column: {}", column))
    }
}

/// Non-fatal notice that a level or token was not part of the fitted
/// vocabulary. The offending cell encodes as zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownLevelWarning {
    pub column: String,
    pub value: String,
    pub row: usize,
}

impl std::fmt::Display for UnknownLevelWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown value '{}' in column '{}' at row {}",
            self.value, self.column, self.row
        )
    }
}
