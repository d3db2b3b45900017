//! The warehouse session seam.
//!
//! A [`Session`] is one logical warehouse connection. Everything the load
//! flow does for a single file (temporary staging table, `COPY`, `MERGE` and
//! the read-back of its counts) runs on the same session, because temporary
//! tables and `LAST_QUERY_ID()` are session scoped.

use tracing::debug;

use crate::error::Result;

/// One result row; `None` is SQL `NULL`.
pub type Row = Vec<Option<String>>;

/// A connection that runs SQL text.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Runs a statement that returns no rows of interest.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Runs a query and returns all rows, every field rendered as text.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;
}

/// Reads the first row of a result as nullable counters.
///
/// Fields that are not unsigned integers read as `None`.
#[must_use]
pub fn numeric_row(rows: &[Row]) -> Option<Vec<Option<u64>>> {
    rows.first().map(|row| {
        row.iter()
            .map(|field| field.as_deref().and_then(|v| v.trim().parse::<u64>().ok()))
            .collect()
    })
}

/// Reads the first field of the first row as a counter, `0` when absent.
#[must_use]
pub fn scalar_count(rows: &[Row]) -> u64 {
    numeric_row(rows)
        .and_then(|row| row.first().copied().flatten())
        .unwrap_or(0)
}

/// Prints every statement instead of running it.
///
/// Queries return no rows, except the `INFORMATION_SCHEMA.COLUMNS` lookup,
/// which returns the configured column list so view DDL can still be
/// rendered.
#[derive(Debug, Clone, Default)]
pub struct DryRunSession {
    columns: Vec<String>,
    statements: Vec<String>,
    quiet: bool,
}

impl DryRunSession {
    /// Creates a dry-run session that prints to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column list returned for column lookups.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Records statements without printing them.
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Statements seen so far, in order.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    fn record(&mut self, sql: &str) {
        debug!(sql = %sql, "Dry run");
        if !self.quiet {
            println!("{sql};");
        }
        self.statements.push(sql.to_string());
    }
}

impl Session for DryRunSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.record(sql);
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.record(sql);
        if sql.contains("INFORMATION_SCHEMA.COLUMNS") {
            return Ok(self
                .columns
                .iter()
                .map(|c| vec![Some(c.clone())])
                .collect());
        }
        Ok(Vec::new())
    }
}
