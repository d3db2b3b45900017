//! Table, stage and load statements.
//!
//! Each operation is a plain struct rendered against a [`Namespace`]. All
//! names are qualified and quoted, and all values go through the literal
//! escaper.

use crate::error::{Result, SqlError};
use crate::ident::{quote_identifier, Literal};
use crate::name::Namespace;
use crate::types::TypeMap;

/// File format shared by external stages and `COPY INTO`.
pub const CSV_FILE_FORMAT: &str =
    "FILE_FORMAT = (TYPE = 'CSV' SKIP_HEADER = 1 FIELD_OPTIONALLY_ENCLOSED_BY = '\"')";

/// `CREATE TABLE IF NOT EXISTS` for the merge target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableOp<'a> {
    /// Target table name (1 to 3 parts).
    pub name: &'a str,
    /// Columns and their types.
    pub columns: &'a TypeMap,
    /// Optional primary key column.
    pub primary_key: Option<&'a str>,
}

impl<'a> CreateTableOp<'a> {
    /// Creates the operation without a primary key.
    #[must_use]
    pub const fn new(name: &'a str, columns: &'a TypeMap) -> Self {
        Self {
            name,
            columns,
            primary_key: None,
        }
    }

    /// Declares `column` as primary key.
    #[must_use]
    pub const fn primary_key(mut self, column: &'a str) -> Self {
        self.primary_key = Some(column);
        self
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// Fails on a malformed table name, a blank column name, or a primary key
    /// that is not one of the columns.
    pub fn to_sql(&self, ns: &Namespace) -> Result<String> {
        if self.columns.is_empty() {
            return Err(SqlError::InvalidIdentifier {
                identifier: self.name.to_string(),
                reason: String::from("table must have at least one column"),
            });
        }
        let mut defs = self
            .columns
            .iter()
            .map(|(col, ty)| Ok(format!("    {} {ty}", quote_identifier(col)?)))
            .collect::<Result<Vec<_>>>()?;

        if let Some(key) = self.primary_key {
            if !self.columns.contains(key) {
                return Err(SqlError::UnknownMergeKey(key.to_string()));
            }
            defs.push(format!("    PRIMARY KEY ({})", quote_identifier(key)?));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            ns.render(self.name)?,
            defs.join(",\n")
        ))
    }
}

/// Session-scoped staging table; every column lands as `VARCHAR` and is
/// cast at merge time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStagingTableOp<'a> {
    /// Staging table name.
    pub name: &'a str,
    /// Columns; only the names are used.
    pub columns: &'a TypeMap,
}

impl<'a> CreateStagingTableOp<'a> {
    /// Creates the operation.
    #[must_use]
    pub const fn new(name: &'a str, columns: &'a TypeMap) -> Self {
        Self { name, columns }
    }

    /// Renders `CREATE OR REPLACE TEMPORARY TABLE`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed table name or a blank column name.
    pub fn to_sql(&self, ns: &Namespace) -> Result<String> {
        let defs = self
            .columns
            .columns()
            .map(|col| Ok(format!("    {} VARCHAR", quote_identifier(col)?)))
            .collect::<Result<Vec<_>>>()?;
        if defs.is_empty() {
            return Err(SqlError::InvalidIdentifier {
                identifier: self.name.to_string(),
                reason: String::from("table must have at least one column"),
            });
        }
        Ok(format!(
            "CREATE OR REPLACE TEMPORARY TABLE {} (\n{}\n)",
            ns.render(self.name)?,
            defs.join(",\n")
        ))
    }
}

/// External S3-compatible stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStageOp {
    /// Stage name.
    pub name: String,
    /// Bucket URL, e.g. `s3://bucket/prefix`.
    pub url: Literal,
    /// Access key id.
    pub access_key: Literal,
    /// Secret key.
    pub secret_key: Literal,
    /// Optional custom endpoint.
    pub endpoint: Option<Literal>,
}

impl CreateStageOp {
    /// Renders `CREATE STAGE IF NOT EXISTS`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed stage name.
    pub fn to_sql(&self, ns: &Namespace) -> Result<String> {
        let mut sql = format!(
            "CREATE STAGE IF NOT EXISTS {}\nURL = {}\nCREDENTIALS = (AWS_KEY_ID = {} AWS_SECRET_KEY = {})",
            ns.render(&self.name)?,
            self.url.to_sql(),
            self.access_key.to_sql(),
            self.secret_key.to_sql()
        );
        if let Some(endpoint) = &self.endpoint {
            sql.push_str(&format!("\nENDPOINT = {}", endpoint.to_sql()));
        }
        sql.push('\n');
        sql.push_str(CSV_FILE_FORMAT);
        Ok(sql)
    }
}

/// Renders `CREATE OR REPLACE STAGE` for an internal stage.
///
/// # Errors
///
/// Fails on a malformed stage name.
pub fn create_internal_stage_sql(ns: &Namespace, stage: &str) -> Result<String> {
    Ok(format!("CREATE OR REPLACE STAGE {}", ns.render(stage)?))
}

/// Renders the upload of a local file into a stage.
///
/// The local path is passed as an escaped literal.
///
/// # Errors
///
/// Fails on a malformed stage name.
pub fn put_file_sql(ns: &Namespace, stage: &str, local_path: &str) -> Result<String> {
    let source = Literal::new(format!("file://{local_path}"));
    Ok(format!(
        "PUT {} {} AUTO_COMPRESS=FALSE OVERWRITE=TRUE",
        source.to_sql(),
        ns.stage_reference(stage, None)?
    ))
}

/// Renders removal of a staged file.
///
/// # Errors
///
/// Fails on a malformed stage name or unsafe file name.
pub fn remove_file_sql(ns: &Namespace, stage: &str, file: &str) -> Result<String> {
    Ok(format!("REMOVE {}", ns.stage_reference(stage, Some(file))?))
}

/// Renders `COPY INTO` from a staged CSV file.
///
/// # Errors
///
/// Fails on malformed names or an unsafe file name.
pub fn copy_into_staging_sql(
    ns: &Namespace,
    staging_table: &str,
    stage: &str,
    file: &str,
) -> Result<String> {
    Ok(format!(
        "COPY INTO {}\nFROM {}\n{CSV_FILE_FORMAT}",
        ns.render(staging_table)?,
        ns.stage_reference(stage, Some(file))?
    ))
}
