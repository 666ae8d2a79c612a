//! Error types for the command-line front end.

use std::path::PathBuf;

use oxide_canon::SqlError;

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The input file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Standard input could not be read.
    #[error("Failed to read standard input: {0}")]
    Stdin(std::io::Error),

    /// The input holds no SQL.
    #[error("No SQL statement in input")]
    EmptyInput,

    /// Analyzing or formatting failed.
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
