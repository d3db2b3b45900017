#![allow(dead_code)]

use stagehand_core::{ColumnSample, Namespace, NativeType, Sample, SampleValue, TypeMap};

pub fn ns() -> Namespace {
    Namespace::new("ETL_DB", "PUBLIC")
}

pub fn types(pairs: &[(&str, &str)]) -> TypeMap {
    TypeMap::from_tokens(pairs.iter().copied())
        .unwrap_or_else(|e| panic!("Invalid type pairs {pairs:?}: {e}"))
}

pub fn token<'a>(map: &'a TypeMap, column: &str) -> &'a str {
    map.get(column)
        .unwrap_or_else(|| panic!("Column {column} missing from {map:?}"))
        .as_str()
}

/// Twenty-row sample shaped like the demo `events.csv`.
pub fn events_sample() -> Sample {
    let names = ["Ana", "Luca", "Mia", "Noah"];
    let countries = ["DE", "IT", "FR", "DE"];
    let dates = ["1/3/25", "2025-01-04", "01/05/2025", "1/6/25"];

    let mut metadata: Vec<String> = (0..20)
        .map(|i| format!("{{\"user_id\": {}, \"device\": {{\"os\": \"ios\"}}}}", 700 + i))
        .collect();
    // 14 of 20 JSON objects: above the 0.6 threshold.
    for cell in metadata.iter_mut().skip(14) {
        *cell = String::from("n/a");
    }

    Sample::new(vec![
        ColumnSample::new(
            "id",
            NativeType::Integer,
            (1..=20).map(SampleValue::Int).collect(),
        ),
        ColumnSample::text("name", (0..20).map(|i| names[i % 4])),
        ColumnSample::text("country", (0..20).map(|i| countries[i % 4])),
        ColumnSample::text("event_date", (0..20).map(|i| dates[i % 4])),
        ColumnSample::text("event_metadata", metadata),
    ])
}
