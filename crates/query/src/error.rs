//! Error types for the query compiler.
//!
//! Every failure aborts the whole compilation: no partial statement is ever
//! returned, and no state outlives the failed call.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The error type for all compiler operations.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A comparator outside the whitelist was supplied.
    ///
    /// This is a security control against operator injection and is never
    /// recovered from.
    #[error("operation not allowed: forbidden comparator '{comparator}'")]
    ForbiddenOperator { comparator: String },

    /// A criteria element is structurally malformed.
    #[error("unsupported condition: {message}")]
    UnsupportedCondition { message: String },

    /// A strategy operation was invoked that the strategy does not provide.
    #[error("strategy '{strategy}' does not implement {operation}")]
    UnsupportedStrategy {
        strategy: &'static str,
        operation: &'static str,
    },

    /// A leaf value cannot be coerced to the declared field type.
    #[error("invalid value for field '{field}': expected {expected}, got {value}")]
    InvalidFieldValue {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// The criteria tree nests entities deeper than the configured limit.
    #[error("criteria nesting depth {depth} exceeds maximum allowed depth {max}")]
    MaxDepthExceeded { depth: usize, max: usize },

    /// The criteria document does not match the expected shape.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] serde_json::Error),
}

impl QueryError {
    /// Creates a [`QueryError::ForbiddenOperator`].
    pub fn forbidden(comparator: impl Into<String>) -> Self {
        QueryError::ForbiddenOperator {
            comparator: comparator.into(),
        }
    }

    /// Creates a [`QueryError::UnsupportedCondition`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        QueryError::UnsupportedCondition {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised by the comparator whitelist.
    pub fn is_forbidden_operator(&self) -> bool {
        matches!(self, QueryError::ForbiddenOperator { .. })
    }
}

/// Result type for compiler operations.
pub type QueryResult<T> = Result<T, QueryError>;
