//! Error types for the schema layer.
//!
//! Every failure here is structural: a malformed schema definition or a
//! malformed field request. Nothing is retried and nothing is recovered
//! locally; errors travel unchanged to the top of the resolution pass.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while looking up, expanding, printing or resolving schema entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field name is not declared on a table.
    #[error("Field \"{field}\" not found on table {table}")]
    FieldNotFound {
        /// The requested (normalized) field name.
        field: String,
        /// Type name of the table that was searched.
        table: String,
    },

    /// A table name is not present in the database registry.
    #[error("Unknown table \"{0}\"")]
    TableNotFound(String),

    /// Structural resolution failure (missing registry, unknown variant,
    /// illegal chain walk, conflicting accumulator records).
    #[error("{0}")]
    Resolution(String),

    /// An operation that a concrete table or join must supply was invoked on
    /// a construct that never supplied it.
    #[error("{0} not overridden")]
    Unimplemented(String),

    /// A saved query name failed the safety validator.
    #[error("{name} is not a valid view name: {reason}")]
    InvalidSavedQueryName {
        name: String,
        reason: String,
    },

    /// A function-call table was invoked with the wrong number of arguments.
    #[error("Table function {table} {message}")]
    InvalidArguments { table: String, message: String },
}

impl SchemaError {
    /// Create a resolution error.
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution(message.into())
    }

    /// Create an unimplemented error for `operation` (e.g. `"Table.to_printed_logical_name"`).
    pub fn unimplemented(operation: impl Into<String>) -> Self {
        Self::Unimplemented(operation.into())
    }

    /// Whether this error reports a missing field or table.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchemaError::FieldNotFound { .. } | SchemaError::TableNotFound(_)
        )
    }
}
