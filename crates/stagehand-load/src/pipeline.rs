//! The end-to-end CSV load: sample, infer, create, load, check.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use stagehand_core::{InferenceConfig, MergeResult, TypeInferenceEngine, TypeMap};
use tracing::info;

use crate::checks::{sample_rows, validate_row_count};
use crate::error::Result;
use crate::loader::Loader;
use crate::sample::read_csv_sample;
use crate::session::Session;

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    table: String,
    inference: InferenceConfig,
    checks: bool,
    min_rows: u64,
    sample_limit: usize,
}

impl Pipeline {
    /// Creates a pipeline loading into `table`, with checks enabled.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            inference: InferenceConfig::default(),
            checks: true,
            min_rows: 1,
            sample_limit: 5,
        }
    }

    /// Sets the inference thresholds.
    #[must_use]
    pub fn inference(mut self, config: InferenceConfig) -> Self {
        self.inference = config;
        self
    }

    /// Enables or disables the post-load checks.
    #[must_use]
    pub fn checks(mut self, enabled: bool) -> Self {
        self.checks = enabled;
        self
    }

    /// Sets the minimum row count the checks require.
    #[must_use]
    pub fn min_rows(mut self, min_rows: u64) -> Self {
        self.min_rows = min_rows;
        self
    }

    /// Infers the type map of a CSV file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read as CSV.
    pub fn infer(&self, csv: &Path) -> Result<TypeMap> {
        let sample = read_csv_sample(csv, None)?;
        Ok(TypeInferenceEngine::new(self.inference).infer_types(&sample))
    }

    /// Runs the load of `csv` through `loader`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable input, a missing merge key, any statement failure
    /// or a failed check.
    pub async fn run<S: Session>(&self, loader: &mut Loader<S>, csv: &Path) -> Result<RunSummary> {
        let types = self.infer(csv)?;
        loader.validate_merge_key(&types)?;
        info!(file = %csv.display(), columns = types.len(), "Schema inferred");

        loader.ensure_table(&self.table, &types).await?;
        loader.ensure_internal_stage().await?;
        let merge = loader.load(csv, &self.table, &types).await?;

        if self.checks {
            let ns = loader.namespace().clone();
            validate_row_count(loader.session_mut(), &ns, &self.table, self.min_rows).await?;
            sample_rows(loader.session_mut(), &ns, &self.table, self.sample_limit).await?;
        }

        Ok(RunSummary {
            input_file: csv
                .file_name()
                .map_or_else(|| csv.display().to_string(), |n| n.to_string_lossy().into_owned()),
            table: self.table.clone(),
            column_count: types.len(),
            merge,
            validation_passed: self.checks,
            views: Vec::new(),
        })
    }
}

/// Outcome of a pipeline run, printed as a compact report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Input file name.
    pub input_file: String,
    /// Target table.
    pub table: String,
    /// Number of inferred columns.
    pub column_count: usize,
    /// Merge counts.
    pub merge: MergeResult,
    /// Whether the checks ran and passed.
    pub validation_passed: bool,
    /// Secure views created after the load.
    pub views: Vec<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validation = if self.validation_passed {
            "passed"
        } else {
            "not run"
        };
        let views = if self.views.is_empty() {
            String::from("none")
        } else {
            self.views.join(", ")
        };
        writeln!(f, "Input: CSV={}", self.input_file)?;
        writeln!(f, "Schema: Columns inferred: {}", self.column_count)?;
        writeln!(
            f,
            "Load: Table={}, Affected={}, Inserts={}, Updates={}",
            self.table, self.merge.affected, self.merge.inserted, self.merge.updated
        )?;
        writeln!(f, "Validation: {validation}")?;
        writeln!(f, "Subsets: Views={views}")?;
        write!(
            f,
            "Summary: Table={}, Affected={}, Validation={validation}",
            self.table, self.merge.affected
        )
    }
}
