//! Table schema module
//!
//! A declarative description of a target table, shared by table creation
//! and value coercion.
//!
//! # Features
//!
//! - **Column Types**: text, integer, double, fixed decimal and timestamp columns
//! - **Nullability**: required columns become `NOT NULL` in the generated DDL
//! - **Default Type**: columns missing from the schema fall back to `TEXT`
//! - **Coercion**: raw JSON values are converted to typed cells, never failing
//! - **SQL Rendering**: `CREATE TABLE IF NOT EXISTS` and multi-row `INSERT` statements

mod coerce;
mod sql;
mod types;

pub use coerce::{coerce_value, parse_timestamp};
pub use sql::{create_table_sql, insert_sql, quote_identifier, validate_identifier};
pub use types::{ColumnDef, ColumnType, TableSchema};
