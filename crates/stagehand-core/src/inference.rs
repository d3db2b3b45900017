//! Column type inference from a bounded sample.
//!
//! Each column is classified independently with the precedence
//! JSON → DATE → native storage type:
//!
//! - **JSON**: up to `sample_size` non-missing values are inspected. Structured
//!   values and non-empty strings count as "checked"; a checked string is valid
//!   JSON only if, trimmed, it starts with `{` or `[` and parses to an object or
//!   array. The column is `VARIANT` when `valid / checked >= json_threshold`.
//!   Blank strings are not counted at all, while non-JSON text counts as
//!   checked-but-invalid.
//! - **DATE**: only for columns whose name contains `date` (any case). The
//!   column is `DATE` when the share of values that parse as a date in any
//!   accepted format reaches `date_threshold`.
//! - Otherwise the native storage type decides.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::{TargetType, TypeMap};

/// A single raw sample value.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    /// No value (empty cell, null).
    Missing,
    /// Integer.
    Int(i64),
    /// Floating point. `NaN` is treated as missing.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// An already-structured value (object or array).
    Json(Value),
    /// A timestamp.
    DateTime(NaiveDateTime),
}

impl SampleValue {
    /// Returns whether this value counts as missing.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing | Self::Json(Value::Null) => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
            Self::DateTime(dt) => dt.to_string(),
        }
    }
}

/// Storage type of a sampled column as the sampling reader saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeType {
    /// Integers.
    Integer,
    /// Floating point.
    Floating,
    /// Booleans.
    Boolean,
    /// Timestamps.
    DateTime,
    /// Text.
    Text,
    /// Mixed or unrecognized storage.
    Unknown,
}

impl NativeType {
    /// Fallback mapping to a target type.
    #[must_use]
    pub const fn target(self) -> TargetType {
        match self {
            Self::Integer => TargetType::Number,
            Self::Floating => TargetType::Float,
            Self::Boolean => TargetType::Boolean,
            Self::DateTime => TargetType::TimestampNtz,
            Self::Text | Self::Unknown => TargetType::Varchar,
        }
    }
}

/// A named, ordered column of sampled values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSample {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub native: NativeType,
    /// Values in source order.
    pub values: Vec<SampleValue>,
}

impl ColumnSample {
    /// Creates a column sample.
    #[must_use]
    pub fn new(name: impl Into<String>, native: NativeType, values: Vec<SampleValue>) -> Self {
        Self {
            name: name.into(),
            native,
            values,
        }
    }

    /// Creates a text column from string cells; empty cells become missing.
    #[must_use]
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                if v.is_empty() {
                    SampleValue::Missing
                } else {
                    SampleValue::Text(v)
                }
            })
            .collect();
        Self::new(name, NativeType::Text, values)
    }

    fn non_missing(&self, limit: usize) -> impl Iterator<Item = &SampleValue> {
        self.values.iter().filter(|v| !v.is_missing()).take(limit)
    }
}

/// A sampled table: columns in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Columns in source order.
    pub columns: Vec<ColumnSample>,
}

impl Sample {
    /// Creates a sample from columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnSample>) -> Self {
        Self { columns }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnSample) -> Self {
        self.columns.push(column);
        self
    }
}

/// Thresholds for inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Minimum valid/checked ratio to classify a column as `VARIANT`.
    pub json_threshold: f64,
    /// Minimum parsed/sampled ratio to classify a column as `DATE`.
    pub date_threshold: f64,
    /// Maximum number of non-missing values inspected per column.
    pub sample_size: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            json_threshold: 0.6,
            date_threshold: 0.8,
            sample_size: 20,
        }
    }
}

impl InferenceConfig {
    /// Sets the JSON threshold.
    #[must_use]
    pub fn with_json_threshold(mut self, threshold: f64) -> Self {
        self.json_threshold = threshold;
        self
    }

    /// Sets the DATE threshold.
    #[must_use]
    pub fn with_date_threshold(mut self, threshold: f64) -> Self {
        self.date_threshold = threshold;
        self
    }

    /// Sets the per-column sample size.
    #[must_use]
    pub const fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }
}

/// Infers target types for sampled columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeInferenceEngine {
    config: InferenceConfig,
}

impl TypeInferenceEngine {
    /// Creates an engine with the given thresholds.
    #[must_use]
    pub const fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Returns the thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infers a type for every column, preserving column order.
    #[must_use]
    pub fn infer_types(&self, sample: &Sample) -> TypeMap {
        let mut map = TypeMap::new();
        for column in &sample.columns {
            map.insert(column.name.clone(), self.infer_column(column));
        }
        map
    }

    /// Infers the type of one column.
    #[must_use]
    pub fn infer_column(&self, column: &ColumnSample) -> TargetType {
        let ty = if self.is_json_column(column) {
            TargetType::Variant
        } else if self.is_date_column(column) {
            TargetType::Date
        } else {
            column.native.target()
        };
        debug!(column = %column.name, native = ?column.native, inferred = %ty, "Inferred column type");
        ty
    }

    /// Returns whether the column holds JSON objects/arrays often enough.
    #[must_use]
    pub fn is_json_column(&self, column: &ColumnSample) -> bool {
        let mut checked = 0_usize;
        let mut valid = 0_usize;

        for value in column.non_missing(self.config.sample_size) {
            match value {
                SampleValue::Json(Value::Object(_) | Value::Array(_)) => {
                    checked += 1;
                    valid += 1;
                }
                SampleValue::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    checked += 1;
                    if looks_like_json_container(trimmed) {
                        valid += 1;
                    }
                }
                _ => {}
            }
        }

        if checked == 0 {
            return false;
        }
        ratio(valid, checked) >= self.config.json_threshold
    }

    /// Returns whether a `date`-named column parses as dates often enough.
    #[must_use]
    pub fn is_date_column(&self, column: &ColumnSample) -> bool {
        if !column.name.to_lowercase().contains("date") {
            return false;
        }

        let mut sampled = 0_usize;
        let mut parsed = 0_usize;
        for value in column.non_missing(self.config.sample_size) {
            sampled += 1;
            let ok = match value {
                SampleValue::DateTime(_) => true,
                other => parse_flexible_date(&other.as_text()).is_some(),
            };
            if ok {
                parsed += 1;
            }
        }

        if sampled == 0 {
            return false;
        }
        ratio(parsed, sampled) >= self.config.date_threshold
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

fn looks_like_json_container(trimmed: &str) -> bool {
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    matches!(
        serde_json::from_str::<Value>(trimmed),
        Ok(Value::Object(_) | Value::Array(_))
    )
}

// Two-digit-year layouts come first: `%Y` accepts "25" as year 0025.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a date written in any of the commonly seen layouts.
///
/// Two-digit years resolve into 1970 to 2069, so `1/3/25` is 2025-01-03.
#[must_use]
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Some(date);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|dt| dt.date_naive())
}
