//! Record normalizer

use super::batch::Batch;
use crate::schema::{coerce_value, TableSchema};
use crate::types::{CellValue, JsonValue, RawRecord};
use std::collections::HashMap;
use tracing::{debug, info};

/// Normalizes raw records against a table schema
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    schema: &'a TableSchema,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for a schema
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    /// Normalize raw records into a batch
    ///
    /// Fields outside the schema are ignored, absent fields become null,
    /// and records missing a required identifier are dropped.
    pub fn normalize(&self, raw_records: &[RawRecord]) -> Batch {
        let columns: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let mut batch = Batch::new(columns);

        let mut dropped = 0usize;
        for (idx, raw) in raw_records.iter().enumerate() {
            match self.normalize_record(raw) {
                Some(row) => batch.push_row(row),
                None => {
                    debug!("Dropping record {idx}: missing required identifier");
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            info!(
                "Dropped {} of {} records missing a required identifier",
                dropped,
                raw_records.len()
            );
        }

        batch
    }

    /// Normalize one record, `None` if a required identifier is missing
    fn normalize_record(&self, raw: &RawRecord) -> Option<Vec<CellValue>> {
        let mut lowered: HashMap<String, &JsonValue> = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            lowered.entry(key.to_lowercase()).or_insert(value);
        }

        let mut row = Vec::with_capacity(self.schema.len());
        for column in self.schema.columns() {
            let cell = lowered
                .get(&column.name)
                .map_or(CellValue::Null, |v| coerce_value(v, column.column_type));

            if column.required && is_missing(&cell) {
                return None;
            }
            row.push(cell);
        }

        Some(row)
    }
}

fn is_missing(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}
