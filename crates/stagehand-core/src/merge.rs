//! Diff-aware `MERGE` from a staging table, and the read-back of its counts.
//!
//! The merge casts staged text columns to their target types in a source
//! subquery, updates matched rows only when at least one non-key column is
//! distinct, and inserts unmatched rows. Re-running the same staged data
//! therefore reports zero inserts and zero updates.
//!
//! Counts are never recomputed. Right after executing the merge, the caller
//! runs [`LAST_QUERY_RESULT_SQL`] on the same session and hands the first
//! row to [`MergeResult::from_row`].

use serde::{Deserialize, Serialize};

use crate::cast::build_cast_expr;
use crate::error::{Result, SqlError};
use crate::ident::quote_identifier;
use crate::name::Namespace;
use crate::types::TypeMap;

/// Reads the action counts of the statement that just ran in this session.
pub const LAST_QUERY_RESULT_SQL: &str = "SELECT * FROM TABLE(RESULT_SCAN(LAST_QUERY_ID()))";

const TARGET_ALIAS: &str = "tgt";
const SOURCE_ALIAS: &str = "src";
const STAGING_ALIAS: &str = "stg";

/// `MERGE INTO target USING (casts from staging)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOp<'a> {
    /// Target table name.
    pub target: &'a str,
    /// Staging table name.
    pub staging: &'a str,
    /// Column matched between target and source.
    pub key: &'a str,
    /// Columns and target types, in insert order.
    pub columns: &'a TypeMap,
}

impl<'a> MergeOp<'a> {
    /// Creates the operation.
    #[must_use]
    pub const fn new(target: &'a str, staging: &'a str, key: &'a str, columns: &'a TypeMap) -> Self {
        Self {
            target,
            staging,
            key,
            columns,
        }
    }

    /// Renders the statement.
    ///
    /// When the key is the only column there is nothing to update and the
    /// `WHEN MATCHED` clause is left out.
    ///
    /// # Errors
    ///
    /// Fails on malformed names, blank column names, or a key that is not in
    /// the type map.
    pub fn to_sql(&self, ns: &Namespace) -> Result<String> {
        if !self.columns.contains(self.key) {
            return Err(SqlError::UnknownMergeKey(self.key.to_string()));
        }

        let target = ns.render(self.target)?;
        let staging = ns.render(self.staging)?;
        let key = quote_identifier(self.key)?;

        let mut select_cols = Vec::with_capacity(self.columns.len());
        let mut insert_cols = Vec::with_capacity(self.columns.len());
        let mut insert_vals = Vec::with_capacity(self.columns.len());
        let mut assignments = Vec::new();
        let mut diffs = Vec::new();

        for (column, ty) in self.columns.iter() {
            let q = quote_identifier(column)?;
            let cast = build_cast_expr(&format!("{STAGING_ALIAS}.{q}"), ty);
            select_cols.push(format!("{cast} AS {q}"));
            insert_vals.push(format!("{SOURCE_ALIAS}.{q}"));

            if column != self.key {
                assignments.push(format!("{TARGET_ALIAS}.{q} = {SOURCE_ALIAS}.{q}"));
                diffs.push(format!(
                    "{TARGET_ALIAS}.{q} IS DISTINCT FROM {SOURCE_ALIAS}.{q}"
                ));
            }
            insert_cols.push(q);
        }

        let mut sql = format!(
            "MERGE INTO {target} {TARGET_ALIAS}\n\
             USING (\n    SELECT {}\n    FROM {staging} {STAGING_ALIAS}\n) {SOURCE_ALIAS}\n\
             ON {TARGET_ALIAS}.{key} = {SOURCE_ALIAS}.{key}\n",
            select_cols.join(", ")
        );
        if !assignments.is_empty() {
            sql.push_str(&format!(
                "WHEN MATCHED AND ({}) THEN\n    UPDATE SET {}\n",
                diffs.join(" OR "),
                assignments.join(", ")
            ));
        }
        sql.push_str(&format!(
            "WHEN NOT MATCHED THEN\n    INSERT ({})\n    VALUES ({})",
            insert_cols.join(", "),
            insert_vals.join(", ")
        ));
        Ok(sql)
    }
}

/// Rows inserted and updated by one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Rows inserted.
    pub inserted: u64,
    /// Rows updated.
    pub updated: u64,
    /// `inserted + updated`, saturating at `u64::MAX`.
    pub affected: u64,
}

impl MergeResult {
    /// Creates a result; `affected` is derived.
    #[must_use]
    pub const fn new(inserted: u64, updated: u64) -> Self {
        Self {
            inserted,
            updated,
            affected: inserted.saturating_add(updated),
        }
    }

    /// Reads the first two fields of the read-back row as inserted/updated.
    ///
    /// A missing row, a short row, or `NULL` fields count as zero.
    #[must_use]
    pub fn from_row(row: Option<&[Option<u64>]>) -> Self {
        let field = |idx: usize| {
            row.and_then(|r| r.get(idx).copied().flatten())
                .unwrap_or(0)
        };
        Self::new(field(0), field(1))
    }
}
