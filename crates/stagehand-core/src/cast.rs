//! Tolerant cast expressions from staged text to target types.
//!
//! Every branch yields `NULL` for a malformed value instead of failing the
//! statement, so one bad row never aborts a load.

use crate::types::{CastType, TargetType};

/// Matches `YYYY-MM-DD`.
const ISO_DATE_PATTERN: &str = "'^[0-9]{4}-[0-9]{2}-[0-9]{2}$'";

/// Matches `M/D/YY` with one- or two-digit month and day.
const SHORT_US_DATE_PATTERN: &str = "'^[0-9]{1,2}/[0-9]{1,2}/[0-9]{2}$'";

/// Wraps `source_expr` (a trusted SQL expression, usually a quoted column
/// reference) in a tolerant conversion to `target`.
///
/// Parameterized tokens such as `NUMBER(38, 0)` and unknown tokens take the
/// stringify branch.
#[must_use]
pub fn build_cast_expr(source_expr: &str, target: &CastType) -> String {
    match target.target() {
        Some(TargetType::Number) => format!("TRY_TO_NUMBER({source_expr})"),
        Some(TargetType::Float) => format!("TRY_TO_DOUBLE({source_expr})"),
        Some(TargetType::Boolean) => format!("TRY_TO_BOOLEAN({source_expr})"),
        Some(TargetType::Variant) => format!("TRY_PARSE_JSON({source_expr})"),
        Some(TargetType::TimestampNtz) => format!("TRY_TO_TIMESTAMP_NTZ({source_expr})"),
        Some(TargetType::Date) => date_cast_expr(source_expr),
        Some(TargetType::Varchar) | None => format!("TO_VARCHAR({source_expr})"),
    }
}

/// ISO dates parse with an explicit format; `M/D/YY` is rewritten to
/// `MM/DD/20YY` first, since a bare two-digit year can land in year 0025.
fn date_cast_expr(source_expr: &str) -> String {
    let trimmed = format!("TRIM({source_expr})");
    let part = |n: u8| format!("SPLIT_PART({trimmed}, '/', {n})");
    let as_20yy = format!(
        "LPAD({}, 2, '0') || '/' || LPAD({}, 2, '0') || '/20' || {}",
        part(1),
        part(2),
        part(3)
    );
    format!(
        "CASE \
         WHEN REGEXP_LIKE({trimmed}, {ISO_DATE_PATTERN}) THEN TRY_TO_DATE({trimmed}, 'YYYY-MM-DD') \
         WHEN REGEXP_LIKE({trimmed}, {SHORT_US_DATE_PATTERN}) THEN TRY_TO_DATE({as_20yy}, 'MM/DD/YYYY') \
         ELSE TRY_TO_DATE({trimmed}) \
         END"
    )
}
