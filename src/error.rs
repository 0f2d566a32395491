//! Error types for the result cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the result cache.
///
/// Execution failures inside a code block are not represented here: the
/// controller observes them through `ExecutionResult` and never raises them.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file exists but is not a readable table
    #[error("Failed to parse cache file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Filesystem failure while creating directories or reading/writing a file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Low-level CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The executed code did not bind the requested variable
    #[error("Name '{0}' is not defined")]
    Name(String),

    /// The requested variable is bound, but not to a table
    #[error("Variable '{0}' is not a table")]
    NotATable(String),

    /// A table was constructed with inconsistent shape or labels
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// The command line could not be parsed
    #[error("Usage: {0}")]
    Usage(String),
}

impl CacheError {
    /// Wraps an `std::io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a parse error for the given cache file.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CacheError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the result cache.
pub type Result<T> = std::result::Result<T, CacheError>;
