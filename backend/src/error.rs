//! Error types for the supply-chain pipeline.
//!
//! - [`CsvError`] - Raw extract reading errors
//! - [`PipelineError`] - Batch run errors (a whole dataset is unusable)
//! - [`PersistenceError`] - Storage errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Per-row and per-field problems never appear here: missing values are
//! filled by the cleaners and join misses are only counted.

use thiserror::Error;

use crate::models::Dataset;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading a raw CSV extract.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("Line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Unreadable spreadsheet workbook.
    #[error("Spreadsheet error: {0}")]
    Workbook(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Batch-level pipeline errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input extract is absent or unreadable.
    #[error("Source '{dataset}' unavailable: {reason}")]
    SourceUnavailable { dataset: Dataset, reason: String },

    /// Failed to write the enriched report.
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors from the relational store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store rejected a dataset batch.
    #[error("Dataset '{dataset}' rejected: {reason}")]
    Rejected { dataset: Dataset, reason: String },

    /// Failed to prepare the database location.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The connection lock was poisoned by a panicking holder.
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Storage error.
    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for storage operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_names_dataset() {
        let err = PipelineError::SourceUnavailable {
            dataset: Dataset::Claims,
            reason: "claims.csv not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("claims"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_error_conversion_chain() {
        let store_err = PersistenceError::Rejected {
            dataset: Dataset::DeliveryLogs,
            reason: "FOREIGN KEY constraint failed".into(),
        };
        let server_err: ServerError = store_err.into();
        assert!(server_err.to_string().contains("delivery_logs"));

        let csv_err = CsvError::EmptyFile;
        let server_err: ServerError = csv_err.into();
        assert!(server_err.to_string().contains("empty"));
    }
}
