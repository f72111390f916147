//! Common types used throughout the crate
//!
//! Type aliases for raw feed records and the typed cell value that
//! every normalized column is made of.

use chrono::NaiveDateTime;
use serde_json::Number;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One flat key/value record as returned by the source feed
pub type RawRecord = JsonObject;

// ============================================================================
// Timestamp Formats
// ============================================================================

/// Format used when rendering timestamps back into raw records
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format used when writing timestamps into archive files
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// ============================================================================
// Cell Values
// ============================================================================

/// A single typed cell of a normalized batch
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Absent or unparseable value; always written as SQL NULL
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    /// Build a float cell, mapping NaN and infinities to `Null`
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            CellValue::Float(value)
        } else {
            CellValue::Null
        }
    }

    /// Check if this cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Get the text content if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render back into a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Text(s) => JsonValue::String(s.clone()),
            CellValue::Integer(i) => JsonValue::Number((*i).into()),
            CellValue::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            CellValue::Timestamp(ts) => {
                JsonValue::String(ts.format(RECORD_TIMESTAMP_FORMAT).to_string())
            }
        }
    }

    /// Render as an archive (CSV) field; nulls become empty fields
    pub fn to_archive_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Timestamp(ts) => ts.format(ARCHIVE_TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_archive_field()),
        }
    }
}
