#![allow(dead_code)]

use stagehand_core::Namespace;
use stagehand_load::{LoadError, Result, Row, Session};

pub fn ns() -> Namespace {
    Namespace::new("ETL_DB", "PUBLIC")
}

pub fn row(fields: &[&str]) -> Row {
    fields.iter().map(|f| Some((*f).to_string())).collect()
}

/// Records statements and replays canned rows for queries containing a
/// given fragment. Statements containing a failure fragment are rejected.
#[derive(Debug, Default)]
pub struct FakeSession {
    pub executed: Vec<String>,
    responses: Vec<(String, Vec<Row>)>,
    failures: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.responses.push((fragment.to_string(), rows));
        self
    }

    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.failures.push(fragment.to_string());
        self
    }

    pub fn position(&self, prefix: &str) -> usize {
        self.executed
            .iter()
            .position(|s| s.starts_with(prefix))
            .unwrap_or_else(|| panic!("No statement starting with {prefix}: {:#?}", self.executed))
    }

    fn record(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        if self.failures.iter().any(|f| sql.contains(f.as_str())) {
            return Err(LoadError::Session {
                statement: sql.to_string(),
                message: String::from("simulated failure"),
            });
        }
        Ok(())
    }
}

impl Session for FakeSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.record(sql)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.record(sql)?;
        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

pub const EVENTS_CSV: &str = "\
id,name,country,event_date,event_metadata
1,Ana,DE,1/3/25,\"{\"\"user_id\"\": 789}\"
2,Luca,IT,2025-01-04,\"{\"\"user_id\"\": 790}\"
3,Mia,DE,01/05/2025,\"{\"\"user_id\"\": 791}\"
";

pub fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
