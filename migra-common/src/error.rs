//! Common error types for MIGRA

use thiserror::Error;

/// Common result type for MIGRA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the pipeline and dashboard
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed data in a source file, surfaced per-file
    #[error("Parse error in {file} (row {row}): {message}")]
    Parse {
        file: String,
        row: usize,
        message: String,
    },

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Parse error helper carrying the offending file and row
    pub fn parse(file: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            file: file.into(),
            row,
            message: message.into(),
        }
    }
}
