//! Post-load sanity checks.

use stagehand_core::checks::{null_count_sql, row_count_sql, sample_rows_sql};
use stagehand_core::Namespace;
use tracing::{debug, info};

use crate::error::{LoadError, Result};
use crate::session::{scalar_count, Row, Session};

/// Fails when `table` holds fewer than `minimum` rows. Returns the count.
///
/// # Errors
///
/// Returns [`LoadError::RowCountBelowMinimum`], or a session error.
pub async fn validate_row_count<S: Session>(
    session: &mut S,
    ns: &Namespace,
    table: &str,
    minimum: u64,
) -> Result<u64> {
    let sql = row_count_sql(ns, table)?;
    debug!(sql = %sql, "Executing SQL");
    let actual = scalar_count(&session.query(&sql).await?);
    if actual < minimum {
        return Err(LoadError::RowCountBelowMinimum {
            table: table.to_string(),
            actual,
            minimum,
        });
    }
    info!(table = %table, rows = actual, "Row count OK");
    Ok(actual)
}

/// Fails on the first column of `columns` that holds a `NULL`.
///
/// # Errors
///
/// Returns [`LoadError::NullsFound`], or a session error.
pub async fn validate_no_nulls<S: Session>(
    session: &mut S,
    ns: &Namespace,
    table: &str,
    columns: &[&str],
) -> Result<()> {
    for column in columns {
        let sql = null_count_sql(ns, table, column)?;
        debug!(sql = %sql, "Executing SQL");
        let count = scalar_count(&session.query(&sql).await?);
        if count > 0 {
            return Err(LoadError::NullsFound {
                table: table.to_string(),
                column: (*column).to_string(),
                count,
            });
        }
    }
    info!(table = %table, columns = columns.len(), "Null check OK");
    Ok(())
}

/// Fetches up to `limit` rows of `table` for display.
///
/// # Errors
///
/// Fails on an invalid table name or a session error.
pub async fn sample_rows<S: Session>(
    session: &mut S,
    ns: &Namespace,
    table: &str,
    limit: usize,
) -> Result<Vec<Row>> {
    let sql = sample_rows_sql(ns, table, limit)?;
    debug!(sql = %sql, "Executing SQL");
    let rows = session.query(&sql).await?;
    info!(table = %table, rows = rows.len(), limit, "Sampled rows");
    Ok(rows)
}
