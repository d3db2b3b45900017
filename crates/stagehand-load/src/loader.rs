//! Stage, staging table, `COPY` and `MERGE` for one CSV file.

use std::path::Path;

use stagehand_core::ddl::{
    copy_into_staging_sql, create_internal_stage_sql, put_file_sql, remove_file_sql,
};
use stagehand_core::{
    CreateStagingTableOp, CreateTableOp, MergeOp, MergeResult, Namespace, TypeMap,
    LAST_QUERY_RESULT_SQL,
};
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::session::{numeric_row, Session};

/// Stage used when none is configured.
pub const DEFAULT_STAGE: &str = "local_stage";

/// Merge key used when none is configured.
pub const DEFAULT_MERGE_KEY: &str = "id";

/// Loads CSV files into typed tables through one session.
pub struct Loader<S: Session> {
    session: S,
    namespace: Namespace,
    stage: String,
    merge_key: String,
}

impl<S: Session> Loader<S> {
    /// Creates a loader with the default stage and merge key.
    pub fn new(session: S, namespace: Namespace) -> Self {
        Self {
            session,
            namespace,
            stage: DEFAULT_STAGE.to_string(),
            merge_key: DEFAULT_MERGE_KEY.to_string(),
        }
    }

    /// Sets the internal stage name.
    #[must_use]
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    /// Sets the merge key column.
    #[must_use]
    pub fn merge_key(mut self, key: impl Into<String>) -> Self {
        self.merge_key = key.into();
        self
    }

    /// Returns the namespace.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the configured merge key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.merge_key
    }

    /// Returns the session.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Consumes the loader, returning the session.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Fails unless the merge key is one of the columns.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingMergeKey`].
    pub fn validate_merge_key(&self, types: &TypeMap) -> Result<()> {
        if types.contains(&self.merge_key) {
            Ok(())
        } else {
            Err(LoadError::MissingMergeKey(self.merge_key.clone()))
        }
    }

    /// Creates the target table if it is missing, keyed on the merge key.
    ///
    /// # Errors
    ///
    /// Fails on invalid names or a session error.
    pub async fn ensure_table(&mut self, table: &str, types: &TypeMap) -> Result<()> {
        let sql = CreateTableOp::new(table, types)
            .primary_key(&self.merge_key)
            .to_sql(&self.namespace)?;
        self.run(&sql).await?;
        info!(table = %table, columns = types.len(), "Target table ready");
        Ok(())
    }

    /// Creates (or replaces) the internal stage.
    ///
    /// # Errors
    ///
    /// Fails on an invalid stage name or a session error.
    pub async fn ensure_internal_stage(&mut self) -> Result<()> {
        let sql = create_internal_stage_sql(&self.namespace, &self.stage)?;
        self.run(&sql).await?;
        info!(stage = %self.stage, "Internal stage ready");
        Ok(())
    }

    /// Loads `file` into `table` and returns the merge counts.
    ///
    /// Runs staging DDL, `PUT`, `COPY` and `MERGE`, then reads the counts of
    /// that `MERGE` back from the session. The staged file is removed
    /// afterwards whether or not the load succeeded; a failed removal is only
    /// logged.
    ///
    /// # Errors
    ///
    /// Fails on invalid names, a file name with unsafe characters, or a
    /// session error before the merge counts were read.
    pub async fn load(&mut self, file: &Path, table: &str, types: &TypeMap) -> Result<MergeResult> {
        let stage_file = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LoadError::InvalidInput(file.to_path_buf()))?
            .to_string();
        let local_path = file.to_string_lossy();
        let staging = format!("{table}_staging");

        let staging_sql = CreateStagingTableOp::new(&staging, types).to_sql(&self.namespace)?;
        let put_sql = put_file_sql(&self.namespace, &self.stage, &local_path)?;
        let copy_sql = copy_into_staging_sql(&self.namespace, &staging, &self.stage, &stage_file)?;
        let merge_sql = MergeOp::new(table, &staging, &self.merge_key, types).to_sql(&self.namespace)?;
        let remove_sql = remove_file_sql(&self.namespace, &self.stage, &stage_file)?;

        self.run(&staging_sql).await?;
        let outcome = self.stage_and_merge(&put_sql, &copy_sql, &merge_sql).await;

        if let Err(e) = self.run(&remove_sql).await {
            warn!(stage = %self.stage, file = %stage_file, error = %e, "Failed to remove staged file");
        }

        let result = outcome?;
        info!(
            table = %table,
            inserted = result.inserted,
            updated = result.updated,
            "Merge complete"
        );
        Ok(result)
    }

    async fn stage_and_merge(&mut self, put: &str, copy: &str, merge: &str) -> Result<MergeResult> {
        self.run(put).await?;
        self.run(copy).await?;
        self.run(merge).await?;
        // Must directly follow the MERGE on this session.
        let rows = self.session.query(LAST_QUERY_RESULT_SQL).await?;
        Ok(MergeResult::from_row(numeric_row(&rows).as_deref()))
    }

    async fn run(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing SQL");
        self.session.execute(sql).await
    }
}
