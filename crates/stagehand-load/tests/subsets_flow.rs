//! Tests for secure view creation from a subset document.

mod common;
use common::*;

use serde_json::json;
use stagehand_core::{SqlError, SubsetConfig};
use stagehand_load::{create_subsets, fetch_columns, read_subset_config, DryRunSession, LoadError};

fn config() -> SubsetConfig {
    SubsetConfig::from_value(&json!({
        "source_table": "events",
        "filters": [
            {"name": "germany_events", "where": "COUNTRY = 'DE'",
             "flatten": ["event_metadata.user_id"]},
            {"name": "recent_signups", "where": "EVENT_TYPE = 'signup'"}
        ]
    }))
    .unwrap()
}

fn columns() -> Vec<stagehand_load::Row> {
    vec![row(&["ID"]), row(&["Country"]), row(&["event_metadata"]), vec![None]]
}

#[tokio::test]
async fn fetch_columns_reads_first_field() {
    let mut session = FakeSession::new().respond("INFORMATION_SCHEMA.COLUMNS", columns());
    let cols = fetch_columns(&mut session, &ns(), "events").await.unwrap();
    assert_eq!(cols, vec!["ID", "Country", "event_metadata"]);
    assert!(session.executed[0].contains("UPPER(TABLE_NAME) = UPPER('events')"));
}

#[tokio::test]
async fn creates_one_view_per_filter() {
    let mut session = FakeSession::new().respond("INFORMATION_SCHEMA.COLUMNS", columns());
    let created = create_subsets(&mut session, &ns(), &config()).await.unwrap();
    assert_eq!(created, vec!["germany_events", "recent_signups"]);

    let views: Vec<&String> = session
        .executed
        .iter()
        .filter(|s| s.starts_with("CREATE OR REPLACE SECURE VIEW"))
        .collect();
    assert_eq!(views.len(), 2);
    assert!(views[0].contains("\"ETL_DB\".\"PUBLIC\".\"germany_events\""));
    assert!(views[0].contains("src.\"Country\" AS COUNTRY"));
    assert!(views[0].contains("AS EVENT_METADATA_USER_ID"));
    assert!(views[0].ends_with("WHERE COUNTRY = 'DE'"));
    assert!(views[1].ends_with("WHERE EVENT_TYPE = 'signup'"));

    // Columns are looked up once per view.
    let lookups = session
        .executed
        .iter()
        .filter(|s| s.contains("INFORMATION_SCHEMA.COLUMNS"))
        .count();
    assert_eq!(lookups, 2);
}

#[tokio::test]
async fn missing_source_table_fails() {
    let mut session = FakeSession::new();
    let err = create_subsets(&mut session, &ns(), &config()).await.unwrap_err();
    assert!(matches!(err, LoadError::Sql(SqlError::NoSourceColumns(ref t)) if t == "events"));
}

#[tokio::test]
async fn first_failing_view_stops_the_run() {
    let mut session = FakeSession::new()
        .respond("INFORMATION_SCHEMA.COLUMNS", columns())
        .fail_on("germany_events");
    let err = create_subsets(&mut session, &ns(), &config()).await.unwrap_err();
    assert!(matches!(err, LoadError::Session { .. }));
    assert!(!session.executed.iter().any(|s| s.contains("recent_signups")));
}

#[tokio::test]
async fn dry_run_renders_views_from_configured_columns() {
    let mut session = DryRunSession::new()
        .with_columns(["id", "country", "event_metadata"])
        .quiet();
    let created = create_subsets(&mut session, &ns(), &config()).await.unwrap();
    assert_eq!(created.len(), 2);
    assert!(session
        .statements()
        .iter()
        .any(|s| s.contains("src.\"event_metadata\" AS EVENT_METADATA")));
}

#[test]
fn reads_yaml_subset_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "subsets.yml",
        "source_table: events\n\
         filters:\n\
         \x20 - name: germany_events\n\
         \x20   where: \"COUNTRY = 'DE'\"\n\
         \x20   flatten:\n\
         \x20     - event_metadata.user_id\n\
         \x20     - path: event_metadata.session_duration\n\
         \x20       type: NUMBER\n",
    );
    let cfg = read_subset_config(&path).unwrap();
    assert_eq!(cfg.source_table, "events");
    assert_eq!(cfg.filters[0].name, "germany_events");
    assert_eq!(cfg.filters[0].where_clause.as_str(), "COUNTRY = 'DE'");
    assert_eq!(cfg.filters[0].flatten.len(), 2);
}

#[test]
fn reads_json_subset_document_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "subsets.json", r#"{"filters": [{"name": "v", "where": "TRUE"}]}"#);
    let cfg = read_subset_config(&path).unwrap();
    assert_eq!(cfg.source_table, "events");
    assert_eq!(cfg.filters[0].name, "v");
}

#[test]
fn subset_document_shape_errors_keep_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "subsets.yaml", "filters:\n  - name: broken\n");
    let err = read_subset_config(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Sql(SqlError::InvalidConfig { ref path, .. }) if path == "filters[0].where"
    ));

    let path = write_csv(&dir, "bad.yaml", "filters: [unclosed\n");
    assert!(matches!(read_subset_config(&path), Err(LoadError::Yaml(_))));
}
