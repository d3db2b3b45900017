//! Validation of subset-view definition documents.
//!
//! A document looks like:
//!
//! ```json
//! {
//!   "source_table": "events",
//!   "filters": [
//!     {"name": "germany_events", "where": "country = 'DE'",
//!      "flatten": ["event_metadata.user_id",
//!                  {"path": "event_metadata.session_duration", "type": "NUMBER"}]}
//!   ]
//! }
//! ```
//!
//! Validation only checks shape and normalizes flatten entries. The `where`
//! text becomes [`TrustedSql`]: the document must come from operators, never
//! from end users.

use serde_json::{Map, Value};

use crate::error::{Result, SqlError};
use crate::ident::TrustedSql;
use crate::types::{CastType, TargetType};
use crate::view::FlattenSpec;

/// Source table used when the document does not name one.
pub const DEFAULT_SOURCE_TABLE: &str = "events";

/// A validated view definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetFilter {
    /// View name, trimmed.
    pub name: String,
    /// Row filter, trimmed.
    pub where_clause: TrustedSql,
    /// JSON projections.
    pub flatten: Vec<FlattenSpec>,
}

/// A validated subset document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetConfig {
    /// Source table, trimmed.
    pub source_table: String,
    /// Filters in document order.
    pub filters: Vec<SubsetFilter>,
}

impl SubsetConfig {
    /// Validates a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidConfig`] naming the offending path, e.g.
    /// `filters[2].flatten[0].path`.
    pub fn from_value(doc: &Value) -> Result<Self> {
        let Value::Object(root) = doc else {
            return Err(SqlError::config("subset config", "must be an object"));
        };

        let source_table = match root.get("source_table") {
            None => DEFAULT_SOURCE_TABLE.to_string(),
            value => required_string(value, "source_table")?,
        };

        let filters = match root.get("filters") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| validate_filter(item, idx))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(SqlError::config("filters", "must be a list")),
        };

        Ok(Self {
            source_table,
            filters,
        })
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidConfig`] for malformed JSON or a bad shape.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| SqlError::config("subset config", format!("is not valid JSON: {e}")))?;
        Self::from_value(&doc)
    }
}

/// Validates a parsed subset document. Same as [`SubsetConfig::from_value`].
///
/// # Errors
///
/// Returns [`SqlError::InvalidConfig`] naming the offending path.
pub fn validate_subset_config(doc: &Value) -> Result<SubsetConfig> {
    SubsetConfig::from_value(doc)
}

fn validate_filter(item: &Value, idx: usize) -> Result<SubsetFilter> {
    let Value::Object(filter) = item else {
        return Err(SqlError::config(format!("filters[{idx}]"), "must be an object"));
    };

    let name = required_string(filter.get("name"), &format!("filters[{idx}].name"))?;
    let where_clause = required_string(filter.get("where"), &format!("filters[{idx}].where"))?;
    let flatten = validate_flatten(filter, idx)?;

    Ok(SubsetFilter {
        name,
        where_clause: TrustedSql::new(where_clause),
        flatten,
    })
}

fn validate_flatten(filter: &Map<String, Value>, idx: usize) -> Result<Vec<FlattenSpec>> {
    let items = match filter.get("flatten") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SqlError::config(
                format!("filters[{idx}].flatten"),
                "must be a list when provided",
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(jdx, item)| {
            let at = format!("filters[{idx}].flatten[{jdx}]");
            match item {
                Value::String(path) => {
                    if path.trim().is_empty() {
                        return Err(SqlError::config(at, "cannot be empty"));
                    }
                    Ok(FlattenSpec::varchar(path.trim()))
                }
                Value::Object(entry) => {
                    let path = required_string(entry.get("path"), &format!("{at}.path"))?;
                    let ty = match entry.get("type") {
                        None | Some(Value::Null) => CastType::from(TargetType::Varchar),
                        Some(Value::String(raw)) if raw.trim().is_empty() => {
                            CastType::from(TargetType::Varchar)
                        }
                        Some(Value::String(raw)) => CastType::parse(raw).map_err(|_| {
                            SqlError::config(format!("{at}.type"), format!("is not a valid type token: {raw}"))
                        })?,
                        Some(_) => {
                            return Err(SqlError::config(
                                format!("{at}.type"),
                                "must be a string when provided",
                            ))
                        }
                    };
                    Ok(FlattenSpec::new(path, ty))
                }
                _ => Err(SqlError::config(at, "must be a string or an object")),
            }
        })
        .collect()
}

fn required_string(value: Option<&Value>, path: &str) -> Result<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SqlError::config(path, "must be a non-empty string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn err_path(doc: &Value) -> String {
        match SubsetConfig::from_value(doc).unwrap_err() {
            SqlError::InvalidConfig { path, .. } => path,
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_string_and_object_flatten() {
        let cfg = SubsetConfig::from_value(&json!({
            "source_table": " events ",
            "filters": [
                {"name": "germany_events", "where": "country = 'DE'",
                 "flatten": ["event_metadata.user_id"]},
                {"name": "recent_signups", "where": "event_type = 'signup'",
                 "flatten": [{"path": "event_metadata.session_duration", "type": "number"}]}
            ]
        }))
        .unwrap();

        assert_eq!(cfg.source_table, "events");
        assert_eq!(cfg.filters.len(), 2);
        assert_eq!(cfg.filters[0].flatten, vec![FlattenSpec::varchar("event_metadata.user_id")]);
        assert_eq!(
            cfg.filters[1].flatten,
            vec![FlattenSpec::new("event_metadata.session_duration", TargetType::Number)]
        );
        assert_eq!(cfg.filters[0].where_clause.as_str(), "country = 'DE'");
    }

    #[test]
    fn test_defaults() {
        let cfg = SubsetConfig::from_value(&json!({})).unwrap();
        assert_eq!(cfg.source_table, DEFAULT_SOURCE_TABLE);
        assert!(cfg.filters.is_empty());

        let cfg = SubsetConfig::from_value(&json!({
            "filters": [{"name": "v", "where": "x = 1", "flatten": null}]
        }))
        .unwrap();
        assert!(cfg.filters[0].flatten.is_empty());
    }

    #[test]
    fn test_missing_where_names_path() {
        let doc = json!({"source_table": "events", "filters": [{"name": "bad_filter"}]});
        assert_eq!(err_path(&doc), "filters[0].where");
    }

    #[test]
    fn test_error_message_includes_path() {
        let err = SubsetConfig::from_value(&json!({"filters": [{"where": "x"}]})).unwrap_err();
        assert_eq!(err.to_string(), "filters[0].name must be a non-empty string");
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(err_path(&json!([])), "subset config");
        assert_eq!(err_path(&json!({"source_table": "  "})), "source_table");
        assert_eq!(err_path(&json!({"source_table": 3})), "source_table");
        assert_eq!(err_path(&json!({"filters": {}})), "filters");
        assert_eq!(err_path(&json!({"source_table": null})), "source_table");
        assert_eq!(err_path(&json!({"filters": null})), "filters");
        assert_eq!(err_path(&json!({"filters": ["x"]})), "filters[0]");
        assert_eq!(
            err_path(&json!({"filters": [{"name": "a", "where": "b", "flatten": "x"}]})),
            "filters[0].flatten"
        );
    }

    #[test]
    fn test_flatten_entry_errors() {
        let ok = json!({"name": "a", "where": "b"});
        let bad = |flatten: Value| json!({"filters": [ok.clone(), {"name": "c", "where": "d", "flatten": flatten}]});

        assert_eq!(err_path(&bad(json!(["  "]))), "filters[1].flatten[0]");
        assert_eq!(err_path(&bad(json!(["a.b", {"type": "NUMBER"}]))), "filters[1].flatten[1].path");
        assert_eq!(err_path(&bad(json!([{"path": ""}]))), "filters[1].flatten[0].path");
        assert_eq!(err_path(&bad(json!([{"path": "a", "type": 5}]))), "filters[1].flatten[0].type");
        assert_eq!(err_path(&bad(json!([{"path": "a", "type": "INT; --"}]))), "filters[1].flatten[0].type");
        assert_eq!(err_path(&bad(json!([7]))), "filters[1].flatten[0]");
    }

    #[test]
    fn test_blank_or_null_type_defaults_to_varchar() {
        let cfg = SubsetConfig::from_value(&json!({
            "filters": [{"name": "a", "where": "b",
                         "flatten": [{"path": "m.x", "type": ""}, {"path": "m.y", "type": null}]}]
        }))
        .unwrap();
        assert!(cfg.filters[0]
            .flatten
            .iter()
            .all(|f| f.ty == CastType::from(TargetType::Varchar)));
    }

    #[test]
    fn test_from_json() {
        let cfg = SubsetConfig::from_json(r#"{"filters": [{"name": "a", "where": "b"}]}"#).unwrap();
        assert_eq!(cfg.filters[0].name, "a");
        assert!(matches!(
            SubsetConfig::from_json("{"),
            Err(SqlError::InvalidConfig { .. })
        ));
    }
}
