//! Error types for sqlmark

use thiserror::Error;

/// Result type alias for sqlmark operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for compilation and statement execution.
///
/// Structural errors (`OperatorUnsupported`, `OperandCount`, `LabelCountMismatch`,
/// `ArgumentCountMismatch`, `InjectionSuspected`, `Validation`) are raised while
/// compiling, before anything reaches the driver.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Unknown operator keyword in an `[operator, operand...]` list
    #[error("Unsupported operator: {0}")]
    OperatorUnsupported(String),

    /// Operator received the wrong number of operands
    #[error("Operator {operator} expects {expected} operand(s), got {got}")]
    OperandCount {
        operator: String,
        expected: String,
        got: usize,
    },

    /// Batch labels and statements disagree in length
    #[error("Label count mismatch: {labels} label(s) for {statements} statement(s)")]
    LabelCountMismatch { labels: usize, statements: usize },

    /// Template placeholder count disagrees with supplied arguments
    #[error("Argument count mismatch: template has {expected} placeholder(s), got {got} argument(s)")]
    ArgumentCountMismatch { expected: usize, got: usize },

    /// Unescaped quote found in a fragment that is emitted without escaping
    #[error("Injection suspected in fragment: {0}")]
    InjectionSuspected(String),

    /// Driver-reported failure
    #[error("Query error: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    /// Database connection error, passed through from the driver
    #[error("Connection error: {0}")]
    Connection(String),

    /// Commit or rollback failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Invalid builder input (empty table name, empty SET list, ...)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SqlError {
    /// Create a query error for a failing statement
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an operand count error
    pub(crate) fn operand_count(
        operator: impl Into<String>,
        expected: impl Into<String>,
        got: usize,
    ) -> Self {
        Self::OperandCount {
            operator: operator.into(),
            expected: expected.into(),
            got,
        }
    }

    /// Check if this error was raised before reaching the driver
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::OperatorUnsupported(_)
                | Self::OperandCount { .. }
                | Self::LabelCountMismatch { .. }
                | Self::ArgumentCountMismatch { .. }
                | Self::InjectionSuspected(_)
                | Self::Validation(_)
        )
    }

    /// Check if this is an injection guard error
    pub fn is_injection_suspected(&self) -> bool {
        matches!(self, Self::InjectionSuspected(_))
    }

    /// Check if this error came from the driver
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Connection(_))
    }
}
