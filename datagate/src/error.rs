//! Error types for the datagate library.

use crate::store::RecordKind;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GateError>;

/// Top-level error type for all datagate operations.
///
/// Expectation failures are deliberately absent from this taxonomy: a rule
/// evaluating to false is a recorded outcome inside a
/// [`ValidationResult`](crate::result::ValidationResult), never an error.
#[derive(Debug, Error)]
pub enum GateError {
    /// Malformed connection string, invalid rule parameters, or a named
    /// dependency that cannot be resolved.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A named record does not exist in the config store.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: RecordKind, name: String },

    /// Attempt to create a named object that already exists with a
    /// conflicting definition.
    #[error("{kind} '{name}' already exists: {reason}")]
    Duplicate {
        kind: RecordKind,
        name: String,
        reason: String,
    },

    /// An expectation references a rule name the engine cannot resolve.
    #[error("unknown expectation rule '{0}'")]
    UnknownRule(String),

    /// The SQL layer cannot reach the underlying source. Surfaced
    /// immediately, never retried.
    #[error("connectivity error ({source_type}): {message}")]
    Connectivity {
        source_type: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rejected identifier, literal or pattern that is unsafe to
    /// interpolate into SQL.
    #[error("security violation: {0}")]
    Security(String),

    /// A backing store (config or results) failed an operation.
    #[error("store error ({backend}, {operation}): {message}")]
    Store {
        backend: String,
        operation: String,
        message: String,
    },

    /// Query engine failure while evaluating an expectation.
    #[error("query engine error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invariant violation inside the library itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        GateError::Configuration(message.into())
    }

    /// Creates a not-found error for a named record.
    pub fn not_found(kind: RecordKind, name: impl Into<String>) -> Self {
        GateError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a duplicate-definition error for a named record.
    pub fn duplicate(
        kind: RecordKind,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GateError::Duplicate {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a connectivity error without an underlying cause.
    pub fn connectivity(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        GateError::Connectivity {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error with backend and operation context.
    pub fn store(
        backend: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        GateError::Store {
            backend: backend.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}
