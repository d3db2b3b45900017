//! Identifier quoting and literal escaping.
//!
//! These are the only functions in the crate that emit a quoted identifier or
//! an escaped string literal. Every other module routes names and values
//! through them. No other sanitization happens: text wrapped in
//! [`TrustedSql`] is spliced into statements verbatim.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, SqlError};

/// Quotes an identifier, preserving case and doubling embedded `"`.
///
/// The name is trimmed first.
///
/// # Errors
///
/// Returns [`SqlError::InvalidIdentifier`] if the name is empty after trimming.
pub fn quote_identifier(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SqlError::InvalidIdentifier {
            identifier: name.to_string(),
            reason: String::from("identifier cannot be empty"),
        });
    }
    let escaped = trimmed.replace('"', "\"\"");
    Ok(format!("\"{escaped}\""))
}

/// Wraps a value in single quotes, doubling embedded `'`.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{escaped}'")
}

/// Escapes a value taken from a loosely typed document.
///
/// # Errors
///
/// Returns [`SqlError::InvalidLiteral`] for anything other than a JSON string.
pub fn escape_literal_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(escape_literal(s)),
        other => Err(SqlError::InvalidLiteral {
            value: other.to_string(),
            reason: String::from("SQL literal value must be a string"),
        }),
    }
}

/// A value that must be escaped before it reaches SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(String);

impl Literal {
    /// Wraps a raw value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the unescaped value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the escaped literal.
    #[must_use]
    pub fn to_sql(&self) -> String {
        escape_literal(&self.0)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl TryFrom<&Value> for Literal {
    type Error = SqlError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self(s.clone())),
            other => Err(SqlError::InvalidLiteral {
                value: other.to_string(),
                reason: String::from("SQL literal value must be a string"),
            }),
        }
    }
}

/// A raw SQL fragment inserted verbatim, e.g. a view `WHERE` clause.
///
/// Nothing checks the contents. Only build one from operator-owned
/// configuration, never from end-user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSql(String);

impl TrustedSql {
    /// Marks `sql` as trusted.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Returns the fragment.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a stage-relative file path before it is appended to `@stage/`.
///
/// # Errors
///
/// Returns [`SqlError::InvalidLiteral`] if the path is empty or contains
/// characters outside `[A-Za-z0-9._/-]`.
pub fn validate_stage_path(path: &str) -> Result<&str> {
    let ok = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'));
    if ok {
        Ok(path)
    } else {
        Err(SqlError::InvalidLiteral {
            value: path.to_string(),
            reason: String::from("stage paths may only contain [A-Za-z0-9._/-]"),
        })
    }
}
