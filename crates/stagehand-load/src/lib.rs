//! # stagehand-load
//!
//! Runs the SQL built by `stagehand-core` against a warehouse [`Session`]:
//! CSV sampling, the stage/staging/`COPY`/`MERGE` load with merge-count
//! read-back, post-load checks and secure subset views.
//!
//! ## Dry run
//!
//! [`DryRunSession`] prints every statement instead of running it:
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use stagehand_core::Namespace;
//! use stagehand_load::{DryRunSession, Loader, Pipeline};
//!
//! # async fn plan() -> stagehand_load::Result<()> {
//! let mut loader = Loader::new(DryRunSession::new(), Namespace::new("ETL_DB", "PUBLIC"));
//! let summary = Pipeline::new("events")
//!     .checks(false)
//!     .run(&mut loader, Path::new("events.csv"))
//!     .await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod sample;
pub mod session;
pub mod subsets;

pub use checks::{sample_rows, validate_no_nulls, validate_row_count};
pub use error::{LoadError, Result};
pub use loader::Loader;
pub use pipeline::{Pipeline, RunSummary};
pub use sample::read_csv_sample;
pub use session::{DryRunSession, Row, Session};
pub use subsets::{create_subsets, fetch_columns, read_subset_config};
