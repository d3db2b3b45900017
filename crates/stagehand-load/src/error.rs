//! Error types for load orchestration.

use std::path::PathBuf;

use stagehand_core::SqlError;

/// Errors raised while loading, checking or creating views.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A statement could not be built.
    #[error("SQL generation error: {0}")]
    Sql(#[from] SqlError),

    /// The CSV input could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A YAML document could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (reading input files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The warehouse rejected a statement.
    #[error("Statement failed: {message}\n  {statement}")]
    Session {
        /// The statement text.
        statement: String,
        /// Driver message.
        message: String,
    },

    /// The CSV path has no usable file name.
    #[error("Invalid input file: {0}")]
    InvalidInput(PathBuf),

    /// The merge key is not among the inferred columns.
    #[error("Missing required merge key column: {0}")]
    MissingMergeKey(String),

    /// A table holds fewer rows than required.
    #[error("Row count {actual} of '{table}' below minimum {minimum}")]
    RowCountBelowMinimum {
        /// Table name as given.
        table: String,
        /// Rows found.
        actual: u64,
        /// Rows required.
        minimum: u64,
    },

    /// A required column holds `NULL`s.
    #[error("Found {count} nulls in '{column}' of '{table}'")]
    NullsFound {
        /// Table name as given.
        table: String,
        /// Offending column.
        column: String,
        /// Number of `NULL` rows.
        count: u64,
    },
}

/// Result type for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;
