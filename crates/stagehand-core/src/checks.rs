//! Metadata and data-quality queries.

use crate::error::Result;
use crate::ident::{escape_literal, quote_identifier};
use crate::name::Namespace;

/// Lists the physical columns of `table` in ordinal order.
///
/// Schema and table are matched case-insensitively and passed as escaped
/// literals; the database selects which `INFORMATION_SCHEMA` to read.
///
/// # Errors
///
/// Fails on a malformed table name.
pub fn list_columns_sql(ns: &Namespace, table: &str) -> Result<String> {
    let name = ns.qualify(table)?;
    Ok(format!(
        "SELECT COLUMN_NAME\nFROM {}.INFORMATION_SCHEMA.COLUMNS\n\
         WHERE UPPER(TABLE_SCHEMA) = UPPER({})\n  AND UPPER(TABLE_NAME) = UPPER({})\n\
         ORDER BY ORDINAL_POSITION",
        quote_identifier(name.database())?,
        escape_literal(name.schema()),
        escape_literal(name.object())
    ))
}

/// `SELECT COUNT(*)` over `table`.
///
/// # Errors
///
/// Fails on a malformed table name.
pub fn row_count_sql(ns: &Namespace, table: &str) -> Result<String> {
    Ok(format!("SELECT COUNT(*) FROM {}", ns.render(table)?))
}

/// Counts rows where `column` is `NULL`.
///
/// # Errors
///
/// Fails on a malformed table name or a blank column.
pub fn null_count_sql(ns: &Namespace, table: &str, column: &str) -> Result<String> {
    Ok(format!(
        "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
        ns.render(table)?,
        quote_identifier(column)?
    ))
}

/// First `limit` rows of `table`.
///
/// # Errors
///
/// Fails on a malformed table name.
pub fn sample_rows_sql(ns: &Namespace, table: &str, limit: usize) -> Result<String> {
    Ok(format!("SELECT * FROM {} LIMIT {limit}", ns.render(table)?))
}
