//! Database loading via DuckDB
//!
//! DuckDB is the SQL engine for every target: it opens local database
//! files directly and reaches PostgreSQL through its postgres extension.

mod engine;
mod loader;

pub use engine::DatabaseEngine;
pub use loader::{DatabaseLoader, RecordSink};

#[cfg(test)]
mod tests;
