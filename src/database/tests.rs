//! Loader tests against local DuckDB files

use super::*;
use crate::config::DatabaseConfig;
use crate::entity::load_entity;
use crate::normalize::{Batch, Normalizer};
use crate::types::RawRecord;
use duckdb::Connection;
use serde_json::json;
use tempfile::TempDir;

fn duckdb_target(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::DuckDb {
        path: dir.path().join("crashes.duckdb"),
    }
}

fn people_batch(value: serde_json::Value) -> (Batch, crate::entity::EntityDescriptor) {
    let people = load_entity("people").unwrap();
    let raw: Vec<RawRecord> = serde_json::from_value(value).unwrap();
    let batch = Normalizer::new(&people.schema).normalize(&raw);
    (batch, people)
}

fn open(dir: &TempDir) -> Connection {
    Connection::open(dir.path().join("crashes.duckdb")).unwrap()
}

#[test]
fn test_load_creates_table_and_inserts() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([
        {"crash_record_id": "A1", "person_id": "P1", "age": "34", "crash_date": "2024-03-07T10:00:00.000"},
        {"crash_record_id": "A2", "person_id": "P2", "bac_result_value": "0.081"}
    ]));

    let loader = DatabaseLoader::new(duckdb_target(&dir));
    let inserted = loader.load(&batch, &people.table, &people.schema).unwrap();
    assert_eq!(inserted, 2);

    let conn = open(&dir);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM chicago_crashes_people", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 2);

    let (age, crash_date): (Option<i32>, Option<String>) = conn
        .query_row(
            "SELECT age, CAST(crash_date AS VARCHAR) FROM chicago_crashes_people WHERE person_id = 'P1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(age, Some(34));
    assert_eq!(crash_date.as_deref(), Some("2024-03-07 10:00:00"));
}

#[test]
fn test_generated_schema_uses_column_types() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([{"crash_record_id": "A1", "person_id": "P1"}]));

    DatabaseLoader::new(duckdb_target(&dir))
        .load(&batch, &people.table, &people.schema)
        .unwrap();

    let conn = open(&dir);
    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_name = 'chicago_crashes_people'",
        )
        .unwrap();
    let columns: Vec<(String, String, String)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();

    let find = |name: &str| {
        columns
            .iter()
            .find(|(n, _, _)| n == name)
            .cloned()
            .unwrap()
    };

    assert_eq!(columns.len(), people.schema.len());
    assert_eq!(find("age").1, "INTEGER");
    assert_eq!(find("crash_date").1, "TIMESTAMP");
    assert_eq!(find("bac_result_value").1, "DECIMAL(5,3)");
    assert_eq!(find("hospital").1, "VARCHAR");
    assert_eq!(find("crash_record_id").2, "NO");
    assert_eq!(find("hospital").2, "YES");
}

#[test]
fn test_missing_values_are_sql_null() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([
        {"crash_record_id": "A1", "person_id": "P1", "bac_result_value": "NaN", "age": null}
    ]));

    DatabaseLoader::new(duckdb_target(&dir))
        .load(&batch, &people.table, &people.schema)
        .unwrap();

    let conn = open(&dir);
    let nulls: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM chicago_crashes_people \
             WHERE bac_result_value IS NULL AND age IS NULL AND hospital IS NULL",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(nulls, 1);
}

#[test]
fn test_out_of_range_values_load_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([
        {"crash_record_id": "A1", "person_id": "P1", "age": "34", "bac_result_value": "0.081"},
        {"crash_record_id": "A2", "person_id": "P2", "age": "3000000000", "bac_result_value": "150"}
    ]));

    let inserted = DatabaseLoader::new(duckdb_target(&dir))
        .load(&batch, &people.table, &people.schema)
        .unwrap();
    assert_eq!(inserted, 2);

    let conn = open(&dir);
    let (age, bac): (Option<i32>, Option<f64>) = conn
        .query_row(
            "SELECT age, CAST(bac_result_value AS DOUBLE) FROM chicago_crashes_people \
             WHERE person_id = 'P2'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(age, None);
    assert_eq!(bac, None);

    let age: Option<i32> = conn
        .query_row(
            "SELECT age FROM chicago_crashes_people WHERE person_id = 'P1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(age, Some(34));
}

#[test]
fn test_repeated_loads_append_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([{"crash_record_id": "A1", "person_id": "P1"}]));
    let loader = DatabaseLoader::new(duckdb_target(&dir));

    assert_eq!(loader.load(&batch, &people.table, &people.schema).unwrap(), 1);
    assert_eq!(loader.load(&batch, &people.table, &people.schema).unwrap(), 1);

    let engine = DatabaseEngine::open(&duckdb_target(&dir)).unwrap();
    assert_eq!(engine.count_rows(&people.table).unwrap(), 2);
}

#[test]
fn test_failed_insert_rolls_back_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    {
        // Existing table with a different column set: the insert cannot match it
        let conn = open(&dir);
        conn.execute_batch(
            "CREATE TABLE chicago_crashes_people (crash_record_id TEXT, person_id TEXT)",
        )
        .unwrap();
    }

    let (batch, people) = people_batch(json!([
        {"crash_record_id": "A1", "person_id": "P1"},
        {"crash_record_id": "A2", "person_id": "P2"}
    ]));

    let result = DatabaseLoader::new(duckdb_target(&dir)).load(&batch, &people.table, &people.schema);
    assert!(result.is_err());

    let engine = DatabaseEngine::open(&duckdb_target(&dir)).unwrap();
    assert_eq!(engine.count_rows(&people.table).unwrap(), 0);
}

#[test]
fn test_failed_first_load_leaves_no_table() {
    let dir = tempfile::tempdir().unwrap();
    let (batch, people) = people_batch(json!([{"crash_record_id": "A1", "person_id": "P1"}]));

    // A bad table name fails before anything is written
    let result = DatabaseLoader::new(duckdb_target(&dir)).load(&batch, "Bad-Table", &people.schema);
    assert!(result.is_err());

    let engine = DatabaseEngine::open(&duckdb_target(&dir)).unwrap();
    assert!(engine.count_rows(&people.table).is_err());
}

#[test]
fn test_empty_batch_does_not_connect() {
    let dir = tempfile::tempdir().unwrap();
    let people = load_entity("people").unwrap();
    let batch = Normalizer::new(&people.schema).normalize(&[]);

    let inserted = DatabaseLoader::new(duckdb_target(&dir))
        .load(&batch, &people.table, &people.schema)
        .unwrap();

    assert_eq!(inserted, 0);
    assert!(!dir.path().join("crashes.duckdb").exists());
}

#[test]
fn test_unreachable_postgres_fails() {
    let config = DatabaseConfig::Postgres(crate::config::PostgresConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..Default::default()
    });
    let (batch, people) = people_batch(json!([{"crash_record_id": "A1", "person_id": "P1"}]));

    let result = DatabaseLoader::new(config).load(&batch, &people.table, &people.schema);
    assert!(result.is_err());
}
