//! Secure subset views with flattened JSON projections.
//!
//! Source columns are first re-projected under deterministic unquoted
//! uppercase aliases, so a configured `WHERE` clause can say `country = 'DE'`
//! no matter how the physical column was cased or quoted.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cast::build_cast_expr;
use crate::error::{Result, SqlError};
use crate::ident::{quote_identifier, TrustedSql};
use crate::name::Namespace;
use crate::types::{CastType, TargetType};

const BASE_ALIAS: &str = "base";
const SOURCE_ALIAS: &str = "src";
const EMPTY_ALIAS: &str = "COL";

/// One JSON path to project out of a semi-structured column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenSpec {
    /// Dotted path; the first segment names a source column.
    pub path: String,
    /// Type of the projected value.
    #[serde(rename = "type")]
    pub ty: CastType,
}

impl FlattenSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(path: impl Into<String>, ty: impl Into<CastType>) -> Self {
        Self {
            path: path.into(),
            ty: ty.into(),
        }
    }

    /// Creates a `VARCHAR` spec.
    #[must_use]
    pub fn varchar(path: impl Into<String>) -> Self {
        Self::new(path, TargetType::Varchar)
    }

    /// Returns the trimmed, non-empty path segments.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::EmptyFlattenPath`] when no segment is left.
    pub fn segments(&self) -> Result<Vec<&str>> {
        let parts: Vec<&str> = self
            .path
            .split('.')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(SqlError::EmptyFlattenPath(self.path.clone()));
        }
        Ok(parts)
    }

    /// Output column name: the dotted path with `.` turned into `_`, then
    /// normalized like every other alias.
    #[must_use]
    pub fn output_alias(&self) -> String {
        unquoted_alias(&self.path.replace('.', "_"))
    }
}

/// Derives an unquoted uppercase identifier token from any column name.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, leading and trailing `_` are
/// stripped, an empty result becomes `COL`, and a leading digit gets a `COL_`
/// prefix.
#[must_use]
pub fn unquoted_alias(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    let token = replaced.trim_matches('_');
    if token.is_empty() {
        return String::from(EMPTY_ALIAS);
    }
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("{EMPTY_ALIAS}_{token}");
    }
    token.to_string()
}

/// Physical column name → projection alias, in encounter order.
///
/// Collisions are resolved by suffixing `_2`, `_3`, … in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionAliases {
    aliases: IndexMap<String, String>,
}

impl ProjectionAliases {
    /// Builds aliases for a physical column list.
    #[must_use]
    pub fn build<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut aliases = IndexMap::new();
        let mut used = HashSet::new();
        for column in columns {
            let column = column.as_ref();
            let base = unquoted_alias(column);
            let mut candidate = base.clone();
            let mut idx = 2_usize;
            while used.contains(&candidate) {
                candidate = format!("{base}_{idx}");
                idx += 1;
            }
            used.insert(candidate.clone());
            aliases.insert(column.to_string(), candidate);
        }
        Self { aliases }
    }

    /// Returns the alias of a physical column (exact match).
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.aliases.get(column).map(String::as_str)
    }

    /// Finds an alias by case-insensitive column name; the last column wins
    /// when several differ only by case.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let wanted = name.to_lowercase();
        self.aliases
            .iter()
            .rev()
            .find(|(column, _)| column.to_lowercase() == wanted)
            .map(|(_, alias)| alias.as_str())
    }

    /// Iterates `(physical, alias)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns whether there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Builds the JSON extraction for `segments` against an aliased base column.
///
/// Each key after the first segment is quoted like an identifier.
///
/// # Errors
///
/// Returns [`SqlError::InvalidIdentifier`] for a blank key.
pub fn json_extract_expr(base_alias: &str, keys: &[&str]) -> Result<String> {
    let mut expr = format!("TRY_PARSE_JSON(TO_VARCHAR({BASE_ALIAS}.{base_alias}))");
    for key in keys {
        expr.push(':');
        expr.push_str(&quote_identifier(key)?);
    }
    Ok(expr)
}

/// `CREATE OR REPLACE SECURE VIEW` over a filtered, re-aliased source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureViewOp<'a> {
    /// View name.
    pub view: &'a str,
    /// Source table name.
    pub source_table: &'a str,
    /// Filter spliced verbatim after `WHERE`.
    pub where_clause: &'a TrustedSql,
    /// JSON paths to project.
    pub flatten: &'a [FlattenSpec],
}

impl<'a> SecureViewOp<'a> {
    /// Creates the operation.
    #[must_use]
    pub const fn new(
        view: &'a str,
        source_table: &'a str,
        where_clause: &'a TrustedSql,
        flatten: &'a [FlattenSpec],
    ) -> Self {
        Self {
            view,
            source_table,
            where_clause,
            flatten,
        }
    }

    /// Renders the view DDL given the live physical columns of the source.
    ///
    /// The `WHERE` clause is not inspected or escaped.
    ///
    /// # Errors
    ///
    /// Fails on malformed names, an empty column list, an empty flatten
    /// path, or a flatten output column that repeats another view column.
    pub fn to_sql<S: AsRef<str>>(&self, ns: &Namespace, source_columns: &[S]) -> Result<String> {
        if source_columns.is_empty() {
            return Err(SqlError::NoSourceColumns(self.source_table.to_string()));
        }
        let aliases = ProjectionAliases::build(source_columns);

        let inner_cols = aliases
            .iter()
            .map(|(column, alias)| Ok(format!("{SOURCE_ALIAS}.{} AS {alias}", quote_identifier(column)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut taken: HashSet<String> = aliases.iter().map(|(_, alias)| alias.to_string()).collect();
        let mut select_cols = vec![format!("{BASE_ALIAS}.*")];
        for spec in self.flatten {
            select_cols.push(flatten_column(&aliases, spec)?);
            let alias = spec.output_alias();
            if !taken.insert(alias.clone()) {
                return Err(SqlError::DuplicateViewColumn {
                    alias,
                    path: spec.path.clone(),
                });
            }
        }

        Ok(format!(
            "CREATE OR REPLACE SECURE VIEW {} AS\n\
             SELECT {}\n\
             FROM (\n    SELECT {}\n    FROM {} {SOURCE_ALIAS}\n) {BASE_ALIAS}\n\
             WHERE {}",
            ns.render(self.view)?,
            select_cols.join(", "),
            inner_cols.join(", "),
            ns.render(self.source_table)?,
            self.where_clause
        ))
    }
}

fn flatten_column(aliases: &ProjectionAliases, spec: &FlattenSpec) -> Result<String> {
    let segments = spec.segments()?;
    let (first, keys) = segments
        .split_first()
        .ok_or_else(|| SqlError::EmptyFlattenPath(spec.path.clone()))?;
    let base = aliases
        .lookup(first)
        .map_or_else(|| unquoted_alias(first), str::to_string);
    let value = flatten_value_expr(&json_extract_expr(&base, keys)?, &spec.ty);
    Ok(format!("{value} AS {}", spec.output_alias()))
}

/// Converts an extracted VARIANT to `ty` through [`build_cast_expr`],
/// yielding `NULL` on a bad value.
///
/// Known conversions get the extract rendered as text first because the
/// tolerant conversions only accept text input. Any other token stringifies.
#[must_use]
pub fn flatten_value_expr(extract: &str, ty: &CastType) -> String {
    match ty.target() {
        Some(TargetType::Variant) => extract.to_string(),
        Some(TargetType::Varchar) | None => build_cast_expr(extract, ty),
        Some(_) => build_cast_expr(&format!("TO_VARCHAR({extract})"), ty),
    }
}
