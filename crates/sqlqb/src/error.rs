//! Error types for sqlqb

use thiserror::Error;

/// Result type alias for sqlqb operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum QbError {
    /// An inferred-operator predicate spec did not match `[AND|OR] <column> [<operator>]`
    #[error("Invalid predicate specification: {0}")]
    InvalidPredicate(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query execution error
    #[cfg(any(feature = "sqlite", feature = "mysql"))]
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    /// Driver error raised while running a statement; `sql` is its debug rendering
    #[cfg(any(feature = "sqlite", feature = "mysql"))]
    #[error("Query error: {source} [SQL: {sql}]")]
    Statement {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More rows than expected
    #[error("Too many rows: expected {expected}, got {got}")]
    TooManyRows { expected: usize, got: usize },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl QbError {
    /// Create an invalid predicate error
    pub fn invalid_predicate(spec: impl Into<String>) -> Self {
        Self::InvalidPredicate(spec.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap a driver error with the statement that caused it.
    #[cfg(any(feature = "sqlite", feature = "mysql"))]
    pub fn statement(source: sqlx::Error, query: &crate::query::Query) -> Self {
        Self::Statement {
            sql: query.to_debug_sql(),
            source,
        }
    }

    /// Create a too-many-rows error
    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::TooManyRows { expected, got }
    }

    /// Check if this is an invalid predicate error
    pub fn is_invalid_predicate(&self) -> bool {
        matches!(self, Self::InvalidPredicate(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The statement (with parameters inlined) a driver error was raised for.
    pub fn sql(&self) -> Option<&str> {
        match self {
            #[cfg(any(feature = "sqlite", feature = "mysql"))]
            Self::Statement { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
