//! Error types shared by the analyzer, the formatter and the query compiler.

use thiserror::Error;

/// Errors raised while normalizing, formatting or compiling SQL.
///
/// Every variant is fatal to the call that produced it: no partial SQL is
/// ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// Malformed input: unbalanced parentheses, unterminated literals or
    /// `CASE` blocks, or a query shape that cannot be expressed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A construct with no registered translation.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// The query references fields that the table metadata does not allow.
    #[error("schema error: {0}")]
    Schema(String),

    /// A query source does not resolve to a usable entity type.
    #[error("type access error: {0}")]
    TypeAccess(String),

    /// A paging operator addresses rows outside the current window.
    #[error("index out of range: {0}")]
    IndexOutOfRange(String),
}

impl SqlError {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    /// Creates an unsupported-construct error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Creates a type access error.
    pub fn type_access(message: impl Into<String>) -> Self {
        Self::TypeAccess(message.into())
    }

    /// Creates an index-range error.
    pub fn index_out_of_range(message: impl Into<String>) -> Self {
        Self::IndexOutOfRange(message.into())
    }
}

/// Result type alias for canonical SQL operations.
pub type Result<T> = std::result::Result<T, SqlError>;
