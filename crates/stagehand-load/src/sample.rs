//! CSV sampling into a typed [`Sample`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use stagehand_core::{ColumnSample, NativeType, Sample, SampleValue};
use tracing::debug;

use crate::error::Result;

/// Reads a CSV file with a header row.
///
/// At most `limit` data rows are read when a limit is given.
///
/// # Errors
///
/// Fails if the file cannot be opened or is not valid CSV.
pub fn read_csv_sample(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Sample> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    sample_from_reader(&mut rdr, limit)
}

/// Reads a sample from an existing CSV reader.
///
/// Each column gets a storage type from its non-empty cells: all integers,
/// all numbers, all `true`/`false`, otherwise text. Empty cells are missing
/// and short rows are padded with missing values.
///
/// # Errors
///
/// Fails on malformed CSV.
pub fn sample_from_reader<R: Read>(rdr: &mut csv::Reader<R>, limit: Option<usize>) -> Result<Sample> {
    let headers = dedupe_headers(rdr.headers()?.iter());
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_idx, record) in rdr.records().enumerate() {
        if limit.is_some_and(|max| row_idx >= max) {
            break;
        }
        let record = record?;
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| {
            let column = typed_column(name, raw);
            debug!(column = %column.name, native = ?column.native, "Sampled column");
            column
        })
        .collect();
    Ok(Sample::new(columns))
}

/// Makes header names unique: `a, a, a` becomes `a, a.1, a.2`. Blank headers
/// become `Unnamed: <index>`.
fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for (idx, header) in raw.enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        while let Some(count) = seen.get(&name).copied() {
            seen.insert(name.clone(), count + 1);
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 1);
        names.push(name);
    }
    names
}

fn typed_column(name: String, raw: Vec<String>) -> ColumnSample {
    let present = || raw.iter().map(|c| c.trim()).filter(|c| !c.is_empty());

    if present().next().is_none() {
        return ColumnSample::new(name, NativeType::Text, vec![SampleValue::Missing; raw.len()]);
    }
    if present().all(|c| c.parse::<i64>().is_ok()) {
        return convert(name, NativeType::Integer, &raw, |c| c.parse().ok().map(SampleValue::Int));
    }
    if present().all(|c| c.parse::<f64>().is_ok()) {
        return convert(name, NativeType::Floating, &raw, |c| c.parse().ok().map(SampleValue::Float));
    }
    if present().all(|c| parse_bool(c).is_some()) {
        return convert(name, NativeType::Boolean, &raw, |c| parse_bool(c).map(SampleValue::Bool));
    }
    ColumnSample::text(name, raw)
}

fn convert(
    name: String,
    native: NativeType,
    raw: &[String],
    parse: impl Fn(&str) -> Option<SampleValue>,
) -> ColumnSample {
    let values = raw
        .iter()
        .map(|c| parse(c.trim()).unwrap_or(SampleValue::Missing))
        .collect();
    ColumnSample::new(name, native, values)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
