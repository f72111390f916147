//! Batch loader
//!
//! Creates the target table if needed and inserts a whole batch in one
//! transaction. The connection lives only for the duration of `load`.

use super::engine::DatabaseEngine;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::normalize::Batch;
use crate::schema::{create_table_sql, insert_sql, TableSchema};
use crate::types::CellValue;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use tracing::{debug, info, warn};

/// Destination for normalized batches
pub trait RecordSink: Send + Sync {
    /// Persist a batch into `table`, returning the number of rows inserted
    ///
    /// Either every row is committed or none is.
    fn load(&self, batch: &Batch, table: &str, schema: &TableSchema) -> Result<usize>;
}

/// Loads batches into the configured database
#[derive(Debug, Clone)]
pub struct DatabaseLoader {
    config: DatabaseConfig,
}

impl DatabaseLoader {
    /// Create a loader for a database target
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl RecordSink for DatabaseLoader {
    fn load(&self, batch: &Batch, table: &str, schema: &TableSchema) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut engine = DatabaseEngine::open(&self.config)?;
        debug!("Connected to {}", engine.connection_info());

        let table_ref = engine.qualified_table(table)?;
        let ddl = create_table_sql(&table_ref, batch.columns(), schema)?;
        let insert = insert_sql(&table_ref, batch.columns(), batch.len())?;

        let tx = engine.connection_mut().transaction()?;
        match write_batch(&tx, &ddl, &insert, batch) {
            Ok(()) => tx.commit()?,
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("Rollback of {} failed: {}", table, rollback);
                }
                return Err(e);
            }
        }

        info!("Inserted {} rows into {}", batch.len(), table);
        Ok(batch.len())
    }
}

/// Run the DDL and the multi-row insert on an open transaction
fn write_batch(conn: &Connection, ddl: &str, insert: &str, batch: &Batch) -> Result<()> {
    debug!("Executing: {}", ddl);
    conn.execute_batch(ddl)?;

    let params = batch.rows().iter().flatten().map(to_sql_value);
    conn.execute(insert, duckdb::params_from_iter(params))?;
    Ok(())
}

/// Convert a cell to a DuckDB parameter; nulls stay SQL NULL
fn to_sql_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Integer(i) => Value::BigInt(*i),
        CellValue::Float(f) if f.is_finite() => Value::Double(*f),
        CellValue::Float(_) => Value::Null,
        CellValue::Timestamp(ts) => {
            Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
    }
}
