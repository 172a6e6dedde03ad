//! Error types for sqlmason

use thiserror::Error;

/// Result type alias for sqlmason operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for schema modeling and query building
#[derive(Debug, Error)]
pub enum SqlError {
    /// Datatype not in the supported set of the column's dialect
    #[error("Unsupported datatype '{datatype}' for column '{column}'")]
    UnsupportedDatatype { column: String, datatype: String },

    /// Dialect name outside the supported set
    #[error("Unsupported dialect: '{0}'. Supported dialects: mysql, mssql")]
    UnsupportedDialect(String),

    /// Table/column key or constraint name failed identifier validation
    #[error("Invalid {kind} '{name}': {reason}")]
    InvalidIdentifier {
        kind: String,
        name: String,
        reason: String,
    },

    /// Column key or normalized name already present in the table
    #[error("Duplicate column '{key}' in table '{table}'")]
    DuplicateColumn { table: String, key: String },

    /// Table lookup failure
    #[error("No table with name '{0}'")]
    UnknownTable(String),

    /// Column lookup failure
    #[error("No column with key '{key}' in table '{table}'")]
    UnknownColumn { table: String, key: String },

    /// Foreign key construction failure; nothing was added
    #[error("Foreign key error: {0}")]
    ForeignKey(String),

    /// Operator rejected for the supplied value kind
    #[error("Invalid use of operator '{operator}': {reason}")]
    InvalidOperator { operator: String, reason: String },

    /// Builder method called out of order
    #[error("'{operation}' cannot be called while the builder is in state '{state}'")]
    Sequence { operation: String, state: String },

    /// Table resolution requested on a builder with no attached schema
    #[error("No schema attached: {0}")]
    MissingSchema(String),

    /// An operation received an empty value set
    #[error("Empty values: {0}")]
    EmptyValues(String),
}

impl SqlError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(
        kind: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            kind: kind.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown column error
    pub fn unknown_column(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a foreign key error
    pub fn foreign_key(message: impl Into<String>) -> Self {
        Self::ForeignKey(message.into())
    }

    /// Create a sequencing error
    pub fn sequence(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::Sequence {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Create an invalid operator error
    pub fn invalid_operator(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperator {
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a sequencing error
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }

    /// Check if this is a foreign key error
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey(_))
    }

    /// Check if this is an identifier validation error
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }

    /// Check if this is an unknown table/column error
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::UnknownTable(_) | Self::UnknownColumn { .. })
    }
}
