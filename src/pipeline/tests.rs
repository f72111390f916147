//! Pipeline tests with in-process stages

use super::*;
use crate::database::RecordSink;
use crate::entity::{load_entity, EntityDescriptor};
use crate::error::{Error, Result};
use crate::http::RecordSource;
use crate::normalize::Batch;
use crate::output::tests::FlakyStore;
use crate::output::{Archiver, Uploader};
use crate::schema::TableSchema;
use crate::types::RawRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Returns canned records, or fails
struct StaticSource(Option<serde_json::Value>);

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self, _url: &str) -> Result<Vec<RawRecord>> {
        match &self.0 {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(Error::http_status(503, "service unavailable")),
        }
    }
}

/// Records every batch it receives
#[derive(Clone, Default)]
struct RecordingSink {
    batches: Arc<Mutex<Vec<(String, usize)>>>,
    fail: bool,
    report_zero: bool,
}

impl RecordingSink {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn inserting_nothing() -> Self {
        Self {
            report_zero: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, usize)> {
        self.batches.lock().unwrap().clone()
    }
}

impl RecordSink for RecordingSink {
    fn load(&self, batch: &Batch, table: &str, _schema: &TableSchema) -> Result<usize> {
        self.batches
            .lock()
            .unwrap()
            .push((table.to_string(), batch.len()));
        if self.fail {
            return Err(Error::database("connection refused"));
        }
        Ok(if self.report_zero { 0 } else { batch.len() })
    }
}

fn people() -> EntityDescriptor {
    load_entity("people").unwrap()
}

fn march_7() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
}

fn one_person() -> serde_json::Value {
    json!([{
        "crash_record_id": "A1",
        "person_id": "P1",
        "age": "34",
        "crash_date": "2024-03-07T10:00:00.000"
    }])
}

fn csv_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|x| x == "csv"))
                .count()
        })
        .unwrap_or(0)
}

#[tokio::test]
async fn test_full_run_without_upload() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        sink.clone(),
        Archiver::new(dir.path()),
    );

    let report = pipeline.run_on(&people(), march_7()).await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.normalized, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(sink.calls(), vec![("chicago_crashes_people".to_string(), 1)]);
    assert_eq!(report.upload(), Some(&UploadOutcome::Disabled));
    assert!(!report.has_failure());

    let path = report.archive_path().unwrap();
    assert!(path.ends_with("chicago_reportCrash_people_2024_03_07.csv"));
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_full_run_with_upload() {
    let dir = tempdir().unwrap();
    let store = Arc::new(InMemory::new());
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        RecordingSink::default(),
        Archiver::new(dir.path()),
    )
    .with_uploader(Uploader::new(store.clone(), "crash-archive"));

    let report = pipeline.run_on(&people(), march_7()).await;

    assert_eq!(
        report.upload(),
        Some(&UploadOutcome::Uploaded {
            key: "Chicago/People/chicago_reportCrash_people_2024_03_07.csv".to_string()
        })
    );
    assert!(store
        .head(&ObjectPath::from(
            "Chicago/People/chicago_reportCrash_people_2024_03_07.csv"
        ))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_fetch_failure_stops_run() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(StaticSource(None), sink.clone(), Archiver::new(dir.path()));

    let report = pipeline.run_on(&people(), march_7()).await;

    assert!(matches!(report.end, RunEnd::FetchFailed { .. }));
    assert!(report.has_failure());
    assert!(sink.calls().is_empty());
    assert_eq!(csv_files(dir.path()), 0);
}

#[tokio::test]
async fn test_empty_feed_ends_without_load() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        StaticSource(Some(json!([]))),
        sink.clone(),
        Archiver::new(dir.path()),
    );

    let report = pipeline.run_on(&people(), march_7()).await;

    assert_eq!(report.end, RunEnd::EmptyFeed);
    assert!(!report.has_failure());
    assert!(sink.calls().is_empty());
    assert_eq!(csv_files(dir.path()), 0);
}

#[tokio::test]
async fn test_all_records_invalid_ends_without_load() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        StaticSource(Some(json!([{"person_id": "P1"}]))),
        sink.clone(),
        Archiver::new(dir.path()),
    );

    let report = pipeline.run_on(&people(), march_7()).await;

    assert_eq!(report.end, RunEnd::NoValidRecords);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.dropped(), 1);
    assert_eq!(report.inserted, 0);
    assert!(sink.calls().is_empty());
    assert_eq!(csv_files(dir.path()), 0);
}

#[tokio::test]
async fn test_load_failure_skips_archive() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::failing();
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        sink.clone(),
        Archiver::new(dir.path()),
    );

    let report = pipeline.run_on(&people(), march_7()).await;

    assert!(matches!(report.end, RunEnd::LoadFailed { .. }));
    assert_eq!(sink.calls().len(), 1);
    assert_eq!(csv_files(dir.path()), 0);
    assert!(!pipeline.archiver().pointer_path(&people()).exists());
}

#[tokio::test]
async fn test_zero_inserted_skips_archive() {
    let dir = tempdir().unwrap();
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        RecordingSink::inserting_nothing(),
        Archiver::new(dir.path()),
    );

    let report = pipeline.run_on(&people(), march_7()).await;

    assert_eq!(report.end, RunEnd::NothingInserted);
    assert_eq!(csv_files(dir.path()), 0);
}

#[tokio::test]
async fn test_archive_failure_keeps_load() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("storage");
    std::fs::write(&blocker, "not a directory").unwrap();

    let sink = RecordingSink::default();
    let store = Arc::new(InMemory::new());
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        sink.clone(),
        Archiver::new(&blocker),
    )
    .with_uploader(Uploader::new(store.clone(), "crash-archive"));

    let report = pipeline.run_on(&people(), march_7()).await;

    assert!(matches!(report.end, RunEnd::ArchiveFailed { .. }));
    assert_eq!(report.inserted, 1);
    assert_eq!(sink.calls().len(), 1);
    assert!(store
        .head(&ObjectPath::from("Chicago/People/.keep"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_upload_failure_keeps_load_and_archive() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(
        StaticSource(Some(one_person())),
        sink.clone(),
        Archiver::new(dir.path()),
    )
    .with_uploader(Uploader::new(
        Arc::new(FlakyStore::failing_put()),
        "crash-archive",
    ));

    let report = pipeline.run_on(&people(), march_7()).await;

    assert!(matches!(
        report.end,
        RunEnd::Archived {
            upload: UploadOutcome::Failed { .. },
            ..
        }
    ));
    assert!(report.has_failure());
    assert_eq!(report.inserted, 1);
    assert_eq!(sink.calls().len(), 1);

    let path = report.archive_path().unwrap();
    assert!(path.exists());
    assert_eq!(
        pipeline.archiver().latest_archive(&people()).unwrap(),
        path.to_path_buf()
    );
}

#[tokio::test]
async fn test_replay_loads_latest_archive() {
    let dir = tempdir().unwrap();
    let first = Pipeline::new(
        StaticSource(Some(one_person())),
        RecordingSink::default(),
        Archiver::new(dir.path()),
    );
    let archived = first.run_on(&people(), march_7()).await;

    let sink = RecordingSink::default();
    let replayer = Pipeline::new(StaticSource(None), sink.clone(), Archiver::new(dir.path()));
    let report = replayer.replay(&people());

    assert_eq!(report.archive_path(), archived.archive_path());
    assert!(matches!(report.end, RunEnd::Replayed { .. }));
    assert_eq!(report.inserted, 1);
    assert_eq!(sink.calls(), vec![("chicago_crashes_people".to_string(), 1)]);
}

#[test]
fn test_replay_without_archive() {
    let dir = tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(StaticSource(None), sink.clone(), Archiver::new(dir.path()));

    let report = pipeline.replay(&people());

    assert!(matches!(report.end, RunEnd::ArchiveUnavailable { .. }));
    assert!(report.has_failure());
    assert!(sink.calls().is_empty());
}

#[test]
fn test_report_display() {
    let mut report = RunReport::new("people");
    report.fetched = 3;
    report.normalized = 2;
    let report = report.finish(RunEnd::NoValidRecords);
    assert_eq!(
        report.to_string(),
        "people: fetched=3 normalized=2 inserted=0 no valid records"
    );
}
