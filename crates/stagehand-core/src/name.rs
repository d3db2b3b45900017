//! Object name resolution.
//!
//! Partial or dotted names (`events`, `raw.events`, `DB.raw.events`) resolve
//! to a canonical [`QualifiedName`] against a [`Namespace`] of defaults. Every
//! object reference in generated SQL goes through here before quoting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};
use crate::ident::{quote_identifier, validate_stage_path};

/// Default database and schema for names given with fewer than three parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Default database.
    pub database: String,
    /// Default schema.
    pub schema: String,
}

impl Namespace {
    /// Creates a namespace.
    #[must_use]
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
        }
    }

    /// Resolves `name` into a three-part name.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidObjectName`] if any segment (including a
    /// default that gets used) is blank, or if `name` has more than three
    /// parts.
    pub fn qualify(&self, name: &str) -> Result<QualifiedName> {
        QualifiedName::resolve(name, &self.database, &self.schema)
    }

    /// Resolves and renders `name` in one step.
    ///
    /// # Errors
    ///
    /// See [`Namespace::qualify`].
    pub fn render(&self, name: &str) -> Result<String> {
        self.qualify(name).map(|q| q.to_string())
    }

    /// Renders a stage reference, `@"db"."schema"."stage"` plus an optional
    /// `/file` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidObjectName`] for a malformed stage name and
    /// [`SqlError::InvalidLiteral`] for a file path with unsafe characters.
    pub fn stage_reference(&self, stage: &str, file: Option<&str>) -> Result<String> {
        let stage_ref = format!("@{}", self.qualify(stage)?);
        match file {
            Some(file) => Ok(format!("{stage_ref}/{}", validate_stage_path(file)?)),
            None => Ok(stage_ref),
        }
    }
}

/// A validated `database.schema.object` triple.
///
/// Each segment is trimmed and non-empty. [`fmt::Display`] renders every
/// segment quoted, joined with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    database: String,
    schema: String,
    object: String,
}

impl QualifiedName {
    /// Splits `name` on `.` and fills missing leading parts from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidObjectName`] on blank segments or more than
    /// three parts.
    pub fn resolve(name: &str, default_database: &str, default_schema: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('.').map(str::trim).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid(name, "object name segments cannot be empty"));
        }

        let (database, schema, object) = match parts.as_slice() {
            [object] => (default_database.trim(), default_schema.trim(), *object),
            [schema, object] => (default_database.trim(), *schema, *object),
            [database, schema, object] => (*database, *schema, *object),
            _ => return Err(invalid(name, "object name must have up to 3 parts")),
        };

        if database.is_empty() || schema.is_empty() {
            return Err(invalid(name, "default database and schema cannot be empty"));
        }

        Ok(Self {
            database: database.to_string(),
            schema: schema.to_string(),
            object: object.to_string(),
        })
    }

    /// Returns the database segment.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the schema segment.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Returns the object segment.
    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Segments are non-empty once resolved, so quoting cannot fail here.
        let quote = |segment: &str| quote_identifier(segment).map_err(|_| fmt::Error);
        write!(
            f,
            "{}.{}.{}",
            quote(&self.database)?,
            quote(&self.schema)?,
            quote(&self.object)?
        )
    }
}

fn invalid(name: &str, reason: &str) -> SqlError {
    SqlError::InvalidObjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
