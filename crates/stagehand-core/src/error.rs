//! Error types for SQL generation, type inference and config validation.

/// Errors raised while building SQL text or validating its inputs.
///
/// Every variant carries the offending input (identifier, token, path) so the
/// caller can locate the bad value without re-deriving it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    /// An identifier was empty after trimming.
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        /// The identifier as supplied.
        identifier: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A value could not be rendered as a string literal.
    #[error("Invalid literal '{value}': {reason}")]
    InvalidLiteral {
        /// The value as supplied.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A dotted object name had empty segments or too many parts.
    #[error("Invalid object name '{name}': {reason}")]
    InvalidObjectName {
        /// The object name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A cast type did not match the allowed type-token pattern.
    #[error("Invalid type token: {0}")]
    InvalidTypeToken(String),

    /// The subset document has the wrong shape at `path`.
    #[error("{path} {message}")]
    InvalidConfig {
        /// Location of the offending value, e.g. `filters[2].flatten[0].path`.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// A flatten path had no non-empty segment.
    #[error("Flatten path cannot be empty: '{0}'")]
    EmptyFlattenPath(String),

    /// The merge key is not one of the mapped columns.
    #[error("Merge key '{0}' is not a column of the type map")]
    UnknownMergeKey(String),

    /// A flatten output column has the same name as another view column.
    #[error("Flatten path '{path}' produces column '{alias}', which the view already has")]
    DuplicateViewColumn {
        /// The output column name.
        alias: String,
        /// The flatten path that produced it.
        path: String,
    },

    /// The physical column list of a view source table was empty.
    #[error("Source table '{0}' has no columns")]
    NoSourceColumns(String),
}

impl SqlError {
    /// Builds an [`SqlError::InvalidConfig`] for the given document path.
    pub(crate) fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for SQL generation.
pub type Result<T> = std::result::Result<T, SqlError>;
