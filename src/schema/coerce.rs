//! Coercion of raw feed values into typed cells
//!
//! Coercion never fails: anything that does not fit the column type
//! becomes `CellValue::Null`.

use super::types::ColumnType;
use crate::types::{CellValue, JsonValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Coerce a raw JSON value to a cell of the given column type
pub fn coerce_value(value: &JsonValue, column_type: ColumnType) -> CellValue {
    match column_type {
        ColumnType::Text => coerce_text(value),
        ColumnType::Integer => coerce_integer(value),
        ColumnType::Double => coerce_float(value),
        ColumnType::Decimal { precision, scale } => coerce_decimal(value, precision, scale),
        ColumnType::Timestamp => value
            .as_str()
            .and_then(parse_timestamp)
            .map_or(CellValue::Null, CellValue::Timestamp),
    }
}

/// Parse a feed timestamp; offsets are converted to UTC and dropped
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn coerce_text(value: &JsonValue) -> CellValue {
    match value {
        JsonValue::Null => CellValue::Null,
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Number(n) => CellValue::Text(n.to_string()),
        // Nested values are kept as their JSON text
        other => CellValue::Text(other.to_string()),
    }
}

fn coerce_integer(value: &JsonValue) -> CellValue {
    let parsed = match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_number)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    };
    // INTEGER columns are 32-bit
    parsed
        .filter(|i| i32::try_from(*i).is_ok())
        .map_or(CellValue::Null, CellValue::Integer)
}

fn coerce_float(value: &JsonValue) -> CellValue {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map_or(CellValue::Null, CellValue::from_f64)
}

/// A decimal keeps at most `precision - scale` integer digits after
/// rounding to `scale` places
fn coerce_decimal(value: &JsonValue, precision: u8, scale: u8) -> CellValue {
    match coerce_float(value) {
        CellValue::Float(f) if fits_decimal(f, precision, scale) => CellValue::Float(f),
        _ => CellValue::Null,
    }
}

fn fits_decimal(value: f64, precision: u8, scale: u8) -> bool {
    let scaled = (value * 10f64.powi(i32::from(scale))).round().abs();
    scaled < 10f64.powi(i32::from(precision))
}

/// Accept floats like `34.0` as integers, reject `34.5`
fn whole_number(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}
