//! Error types for the sales analytics pipeline.
//!
//! Errors are arranged by stage:
//!
//! - [`DataFormatError`] - Unreadable input or a required column missing (fatal)
//! - [`ConfigError`] - Invalid configuration file or environment override
//! - [`ReportError`] - Failures while writing tables, JSON, report or dashboard
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Row-level problems are not errors: they become
//! [`crate::clean::RowValidationWarning`]s in the cleaning summary. Ratios with
//! a zero denominator are not errors either: they resolve to a sentinel.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Input Format Errors
// =============================================================================

/// Errors while loading or interpreting the raw table. Always fatal.
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// File extension not recognized as CSV or workbook.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to decode the file content.
    #[error("Failed to decode file: {0}")]
    Encoding(String),

    /// Invalid CSV structure.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Empty file.
    #[error("Input file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in input")]
    NoHeaders,

    /// A required logical column has no matching header.
    #[error("Missing required column '{column}' (accepted headers: {})", expected.join(", "))]
    MissingColumn {
        column: String,
        expected: Vec<String>,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the analytics configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON or does not fit the expected shape.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config violates the embedded schema.
    #[error("Config failed schema validation: {}", errors.join("; "))]
    Schema { errors: Vec<String> },

    /// Environment override has an invalid value.
    #[error("Invalid value for {var}: {message}")]
    InvalidOverride { var: String, message: String },
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while exporting results.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output file could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Table export failed.
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// KPI serialization failed.
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chart rendering failed.
    #[error("Dashboard rendering failed: {0}")]
    Chart(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::pipeline::run_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input format error.
    #[error("Data format error: {0}")]
    DataFormat(#[from] DataFormatError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Export error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading and cleaning.
pub type DataResult<T> = Result<T, DataFormatError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for exports.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for end-to-end runs.
pub type RunResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // DataFormatError -> PipelineError
        let err = DataFormatError::EmptyFile;
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // ReportError -> PipelineError
        let err = ReportError::Chart("no area".into());
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains("no area"));
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let err = DataFormatError::MissingColumn {
            column: "amount".into(),
            expected: vec!["amount".into(), "sales".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'amount'"));
        assert!(msg.contains("amount, sales"));
    }

    #[test]
    fn test_schema_error_format() {
        let err = ConfigError::Schema {
            errors: vec!["top_n must be >= 1".into(), "bad month".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("top_n must be >= 1; bad month"));
    }
}
