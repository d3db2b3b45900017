//! # stagehand-core
//!
//! Schema inference and injection-safe SQL generation for staged CSV loads
//! into Snowflake.
//!
//! This crate provides:
//! - Identifier quoting and literal escaping as the single choke point for
//!   everything spliced into SQL text
//! - Resolution of partial object names against a default database/schema
//! - Heuristic type inference over a sampled dataset
//! - Tolerant cast expressions, diff-aware `MERGE` and merge-count read-back
//! - Secure subset views with flattened JSON projections
//!
//! Nothing here talks to a warehouse. Every builder returns SQL text; running
//! it is up to the caller.
//!
//! ## Inferring a type map and merging
//!
//! ```rust
//! use stagehand_core::{
//!     ColumnSample, MergeOp, Namespace, Sample, TypeInferenceEngine, InferenceConfig,
//! };
//!
//! let sample = Sample::new(vec![
//!     ColumnSample::text("id", ["1", "2", "3"]),
//!     ColumnSample::text("event_date", ["1/3/25", "2024-02-01", "03/15/2024"]),
//! ]);
//! let types = TypeInferenceEngine::new(InferenceConfig::default()).infer_types(&sample);
//! assert_eq!(types.get("event_date").map(|t| t.as_str()), Some("DATE"));
//!
//! let ns = Namespace::new("ETL_DB", "PUBLIC");
//! let sql = MergeOp::new("events", "events_staging", "id", &types).to_sql(&ns).unwrap();
//! assert!(sql.starts_with("MERGE INTO \"ETL_DB\".\"PUBLIC\".\"events\""));
//! ```
//!
//! ## Trust boundary
//!
//! Names go through [`quote_identifier`], values through [`escape_literal`].
//! A view `WHERE` clause is a [`TrustedSql`] fragment and is inserted as is:
//!
//! ```rust
//! use stagehand_core::{FlattenSpec, Namespace, SecureViewOp, TrustedSql};
//!
//! let ns = Namespace::new("ETL_DB", "PUBLIC");
//! let where_clause = TrustedSql::new("country = 'DE'");
//! let flatten = [FlattenSpec::varchar("event_metadata.user_id")];
//! let sql = SecureViewOp::new("germany_events", "events", &where_clause, &flatten)
//!     .to_sql(&ns, &["id", "country", "event_metadata"])
//!     .unwrap();
//! assert!(sql.ends_with("WHERE country = 'DE'"));
//! ```

pub mod cast;
pub mod checks;
pub mod config;
pub mod ddl;
pub mod error;
pub mod ident;
pub mod inference;
pub mod merge;
pub mod name;
pub mod subset;
pub mod types;
pub mod view;

pub use cast::build_cast_expr;
pub use config::WarehouseSettings;
pub use ddl::{CreateStageOp, CreateStagingTableOp, CreateTableOp};
pub use error::{Result, SqlError};
pub use ident::{escape_literal, escape_literal_value, quote_identifier, Literal, TrustedSql};
pub use inference::{
    ColumnSample, InferenceConfig, NativeType, Sample, SampleValue, TypeInferenceEngine,
};
pub use merge::{MergeOp, MergeResult, LAST_QUERY_RESULT_SQL};
pub use name::{Namespace, QualifiedName};
pub use subset::{validate_subset_config, SubsetConfig, SubsetFilter};
pub use types::{CastType, TargetType, TypeMap};
pub use view::{FlattenSpec, ProjectionAliases, SecureViewOp};
