//! Tests for the staged load flow.

mod common;
use common::*;

use stagehand_core::{MergeResult, TypeMap, LAST_QUERY_RESULT_SQL};
use stagehand_load::{LoadError, Loader, Pipeline};

fn events_types() -> TypeMap {
    TypeMap::from_tokens([("id", "NUMBER"), ("name", "VARCHAR")]).unwrap()
}

#[tokio::test]
async fn load_runs_statements_in_order_and_reads_back_counts() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let session = FakeSession::new().respond("RESULT_SCAN", vec![row(&["3", "1"])]);
    let mut loader = Loader::new(session, ns());

    let result = loader.load(&csv, "events", &events_types()).await.unwrap();
    assert_eq!(result, MergeResult::new(3, 1));

    let session = loader.into_session();
    let order: Vec<&str> = session
        .executed
        .iter()
        .map(|s| s.split_whitespace().next().unwrap_or(""))
        .collect();
    assert_eq!(order, vec!["CREATE", "PUT", "COPY", "MERGE", "SELECT", "REMOVE"]);
    assert_eq!(session.executed[4], LAST_QUERY_RESULT_SQL);
    assert!(session.executed[0].contains("\"ETL_DB\".\"PUBLIC\".\"events_staging\""));
    assert!(session.executed[1].starts_with("PUT 'file://"));
    assert!(session.executed[1].contains("@\"ETL_DB\".\"PUBLIC\".\"local_stage\""));
    assert!(session.executed[5].ends_with("\"local_stage\"/events.csv"));
}

#[tokio::test]
async fn read_back_without_rows_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let mut loader = Loader::new(FakeSession::new(), ns());
    let result = loader.load(&csv, "events", &events_types()).await.unwrap();
    assert_eq!(result, MergeResult::default());
}

#[tokio::test]
async fn cleanup_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let session = FakeSession::new()
        .respond("RESULT_SCAN", vec![row(&["0", "0"])])
        .fail_on("REMOVE");
    let mut loader = Loader::new(session, ns());
    let result = loader.load(&csv, "events", &events_types()).await.unwrap();
    assert_eq!(result.affected, 0);
}

#[tokio::test]
async fn failed_copy_still_removes_staged_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let mut loader = Loader::new(FakeSession::new().fail_on("COPY INTO"), ns());

    let err = loader.load(&csv, "events", &events_types()).await.unwrap_err();
    assert!(matches!(err, LoadError::Session { ref statement, .. } if statement.starts_with("COPY INTO")));

    let session = loader.into_session();
    assert!(!session.executed.iter().any(|s| s.starts_with("MERGE")));
    assert!(session.executed.last().unwrap().starts_with("REMOVE"));
}

#[tokio::test]
async fn unsafe_file_name_is_rejected_before_any_statement() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "ev'ents.csv", EVENTS_CSV);
    let mut loader = Loader::new(FakeSession::new(), ns());
    let err = loader.load(&csv, "events", &events_types()).await.unwrap_err();
    assert!(matches!(err, LoadError::Sql(_)));
    assert!(loader.into_session().executed.is_empty());
}

#[tokio::test]
async fn pipeline_infers_creates_loads_and_checks() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let session = FakeSession::new()
        .respond("RESULT_SCAN", vec![row(&["3", "0"])])
        .respond("SELECT COUNT(*)", vec![row(&["3"])]);
    let mut loader = Loader::new(session, ns()).stage("etl_stage");

    let summary = Pipeline::new("events").run(&mut loader, &csv).await.unwrap();
    assert_eq!(summary.merge, MergeResult::new(3, 0));
    assert_eq!(summary.column_count, 5);
    assert!(summary.validation_passed);
    assert_eq!(summary.input_file, "events.csv");

    let session = loader.into_session();
    let create = &session.executed[session.position("CREATE TABLE IF NOT EXISTS")];
    assert!(create.contains("\"id\" NUMBER"));
    assert!(create.contains("\"event_date\" DATE"));
    assert!(create.contains("\"event_metadata\" VARIANT"));
    assert!(create.contains("PRIMARY KEY (\"id\")"));
    assert!(session.position("CREATE OR REPLACE STAGE") < session.position("PUT"));
    assert!(session.position("REMOVE") < session.position("SELECT COUNT(*)"));
    assert!(session.executed.last().unwrap().ends_with("LIMIT 5"));
}

#[tokio::test]
async fn pipeline_requires_merge_key() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", "name,country\nAna,DE\n");
    let mut loader = Loader::new(FakeSession::new(), ns());
    let err = Pipeline::new("events").run(&mut loader, &csv).await.unwrap_err();
    assert!(matches!(err, LoadError::MissingMergeKey(ref k) if k == "id"));
    assert!(loader.into_session().executed.is_empty());
}

#[tokio::test]
async fn pipeline_fails_on_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(&dir, "events.csv", EVENTS_CSV);
    let mut loader = Loader::new(FakeSession::new(), ns());
    let err = Pipeline::new("events").run(&mut loader, &csv).await.unwrap_err();
    assert!(matches!(
        err,
        LoadError::RowCountBelowMinimum { actual: 0, minimum: 1, .. }
    ));
}
