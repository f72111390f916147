//! SQL statement rendering for a table schema

use super::types::TableSchema;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid")
});

/// Check that a table or column name is a plain lower-case identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Validate and double-quote an identifier
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{name}\""))
}

/// Render `CREATE TABLE IF NOT EXISTS` for the given batch columns
///
/// `table` is an already-qualified, already-quoted table reference.
/// Each column takes its type from the schema, `TEXT` if unmapped.
pub fn create_table_sql(table: &str, columns: &[String], schema: &TableSchema) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::database("Cannot create a table without columns"));
    }

    let fields = columns
        .iter()
        .map(|name| {
            let quoted = quote_identifier(name)?;
            let sql_type = schema.column_type(name).sql_type();
            if schema.is_nullable(name) {
                Ok(format!("{quoted} {sql_type}"))
            } else {
                Ok(format!("{quoted} {sql_type} NOT NULL"))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        fields.join(", ")
    ))
}

/// Render one parameterized multi-row `INSERT` covering every column of every row
pub fn insert_sql(table: &str, columns: &[String], row_count: usize) -> Result<String> {
    if columns.is_empty() || row_count == 0 {
        return Err(Error::database("Cannot insert an empty batch"));
    }

    let fields = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Result<Vec<_>>>()?;

    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![placeholders.as_str(); row_count].join(", ");

    Ok(format!(
        "INSERT INTO {table} ({}) VALUES {values}",
        fields.join(", ")
    ))
}
