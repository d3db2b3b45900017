//! Warehouse type tokens and the column type map.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};

static CAST_TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9_]*(\([0-9,\s]+\))?$").expect("cast type pattern is valid")
});

/// Target types produced by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    /// Exact numeric.
    Number,
    /// Double precision.
    Float,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp without time zone.
    TimestampNtz,
    /// Text.
    Varchar,
    /// Semi-structured JSON.
    Variant,
}

impl TargetType {
    /// All target types.
    pub const ALL: [Self; 7] = [
        Self::Number,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::TimestampNtz,
        Self::Varchar,
        Self::Variant,
    ];

    /// Returns the SQL token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::TimestampNtz => "TIMESTAMP_NTZ",
            Self::Varchar => "VARCHAR",
            Self::Variant => "VARIANT",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| SqlError::InvalidTypeToken(s.to_string()))
    }
}

/// A validated cast/column type token such as `NUMBER` or `NUMBER(38, 0)`.
///
/// Tokens are trimmed and uppercased, then matched against a strict pattern
/// so a "type" field can never smuggle extra SQL into a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CastType(String);

impl CastType {
    /// Validates and normalizes a type token.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidTypeToken`] if the token does not match.
    pub fn parse(token: &str) -> Result<Self> {
        let normalized = token.trim().to_ascii_uppercase();
        if CAST_TYPE_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(SqlError::InvalidTypeToken(token.to_string()))
        }
    }

    /// Returns the normalized token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the matching [`TargetType`] for bare tokens.
    #[must_use]
    pub fn target(&self) -> Option<TargetType> {
        TargetType::ALL.into_iter().find(|t| t.as_str() == self.0)
    }
}

impl From<TargetType> for CastType {
    fn from(value: TargetType) -> Self {
        Self(value.as_str().to_string())
    }
}

impl FromStr for CastType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for CastType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column name to type token, in source column order.
///
/// Order drives every generated column list (DDL, MERGE, INSERT).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMap {
    columns: IndexMap<String, CastType>,
}

impl TypeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(column, token)` string pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidTypeToken`] on the first bad token.
    pub fn from_tokens<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (column, token) in pairs {
            map.insert(column, CastType::parse(token.as_ref())?);
        }
        Ok(map)
    }

    /// Inserts or replaces a column, keeping its original position on replace.
    pub fn insert(&mut self, column: impl Into<String>, ty: impl Into<CastType>) {
        self.columns.insert(column.into(), ty.into());
    }

    /// Returns the type of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CastType> {
        self.columns.get(column)
    }

    /// Returns whether `column` is mapped.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Iterates `(column, type)` in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CastType)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_round_trip_tokens() {
        for t in TargetType::ALL {
            assert_eq!(t.as_str().parse::<TargetType>().unwrap(), t);
        }
        assert_eq!("timestamp_ntz".parse::<TargetType>().unwrap(), TargetType::TimestampNtz);
        assert!("TEXT".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_cast_type_normalizes() {
        assert_eq!(CastType::parse(" number ").unwrap().as_str(), "NUMBER");
        assert_eq!(CastType::parse("number(38, 0)").unwrap().as_str(), "NUMBER(38, 0)");
    }

    #[test]
    fn test_cast_type_rejects_injection() {
        for bad in [
            "",
            "VARCHAR; DROP TABLE x",
            "NUMBER) AS x FROM y --",
            "1NUMBER",
            "VARCHAR(abc)",
        ] {
            assert!(
                matches!(CastType::parse(bad), Err(SqlError::InvalidTypeToken(ref t)) if t == bad),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn test_cast_type_target() {
        assert_eq!(CastType::from(TargetType::Variant).target(), Some(TargetType::Variant));
        assert_eq!(CastType::parse("NUMBER(10,2)").unwrap().target(), None);
    }

    #[test]
    fn test_type_map_keeps_insertion_order() {
        let map = TypeMap::from_tokens([("id", "NUMBER"), ("name", "VARCHAR"), ("at", "DATE")]).unwrap();
        assert_eq!(map.columns().collect::<Vec<_>>(), vec!["id", "name", "at"]);
        assert_eq!(map.get("at").unwrap().as_str(), "DATE");
    }

    #[test]
    fn test_type_map_rejects_bad_token() {
        let err = TypeMap::from_tokens([("id", "NUMBER"), ("x", "INT; --")]).unwrap_err();
        assert_eq!(err, SqlError::InvalidTypeToken(String::from("INT; --")));
    }

    #[test]
    fn test_type_map_deserialize_validates() {
        let map: TypeMap = serde_json::from_str(r#"{"id": "number", "meta": "variant"}"#).unwrap();
        assert_eq!(map.get("id").unwrap().as_str(), "NUMBER");
        assert!(serde_json::from_str::<TypeMap>(r#"{"id": "NUMBER --"}"#).is_err());
    }
}
