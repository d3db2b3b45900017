//! Secure subset views from a validated subset document.

use std::path::Path;

use serde_json::Value;
use stagehand_core::checks::list_columns_sql;
use stagehand_core::{Namespace, SecureViewOp, SubsetConfig};
use tracing::{debug, info};

use crate::error::Result;
use crate::session::Session;

/// Reads and validates a subset document.
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or has the wrong shape.
pub fn read_subset_config(path: &Path) -> Result<SubsetConfig> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let doc: Value = if is_json {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    };
    debug!(file = %path.display(), "Subset config loaded");
    Ok(SubsetConfig::from_value(&doc)?)
}

/// Lists the physical columns of `table`, in ordinal order.
///
/// # Errors
///
/// Fails on an invalid table name or a session error.
pub async fn fetch_columns<S: Session>(session: &mut S, ns: &Namespace, table: &str) -> Result<Vec<String>> {
    let sql = list_columns_sql(ns, table)?;
    debug!(sql = %sql, "Executing SQL");
    let rows = session.query(&sql).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().flatten())
        .collect())
}

/// Creates one secure view per filter and returns their names.
///
/// The source columns are looked up again for every view, so each view sees
/// the table as it is when that view is created. The first failure stops the
/// run.
///
/// # Errors
///
/// Fails on invalid names, a source table without columns, an empty flatten
/// path, or a session error.
pub async fn create_subsets<S: Session>(
    session: &mut S,
    ns: &Namespace,
    config: &SubsetConfig,
) -> Result<Vec<String>> {
    let mut created = Vec::with_capacity(config.filters.len());
    for filter in &config.filters {
        let columns = fetch_columns(session, ns, &config.source_table).await?;
        let sql = SecureViewOp::new(
            &filter.name,
            &config.source_table,
            &filter.where_clause,
            &filter.flatten,
        )
        .to_sql(ns, &columns)?;
        debug!(sql = %sql, "Executing SQL");
        session.execute(&sql).await?;
        info!(view = %filter.name, source = %config.source_table, "View created");
        created.push(filter.name.clone());
    }
    Ok(created)
}
