//! CSV archive writer

use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::normalize::Batch;
use crate::types::{JsonValue, RawRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Field delimiter of archive files
const DELIMITER: u8 = b';';

/// Writes batches into a storage directory
#[derive(Debug, Clone)]
pub struct Archiver {
    dir: PathBuf,
}

impl Archiver {
    /// Create an archiver writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the pointer file for an entity
    pub fn pointer_path(&self, entity: &EntityDescriptor) -> PathBuf {
        self.dir.join(entity.pointer_file_name())
    }

    /// Write the batch as `<prefix>_<entity>_<YYYY_MM_DD>.csv` and point the
    /// entity's pointer file at it
    ///
    /// An archive from earlier the same day is overwritten.
    pub fn archive(
        &self,
        batch: &Batch,
        entity: &EntityDescriptor,
        date: NaiveDate,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::archive(format!(
                "Failed to create directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.dir.join(entity.archive_file_name(date));
        write_csv(&path, batch)?;
        info!("Archived {} rows to {}", batch.len(), path.display());

        let pointer = self.pointer_path(entity);
        fs::write(&pointer, format!("{}\n", path.display())).map_err(|e| {
            Error::archive(format!(
                "Failed to write pointer file {}: {e}",
                pointer.display()
            ))
        })?;

        Ok(path)
    }

    /// Path recorded in the entity's pointer file
    pub fn latest_archive(&self, entity: &EntityDescriptor) -> Result<PathBuf> {
        let pointer = self.pointer_path(entity);
        let content = fs::read_to_string(&pointer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: pointer.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        let line = content.lines().next().map(str::trim).unwrap_or_default();
        if line.is_empty() {
            return Err(Error::archive(format!(
                "Pointer file {} is empty",
                pointer.display()
            )));
        }
        Ok(PathBuf::from(line))
    }
}

fn write_csv(path: &Path, batch: &Batch) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)
        .map_err(|e| Error::archive(format!("Failed to create {}: {e}", path.display())))?;

    writer.write_record(batch.columns())?;
    for row in batch.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_archive_field()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read an archive back into raw records; empty fields become null
pub fn read_archive(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(name, field)| {
                let value = if field.is_empty() {
                    JsonValue::Null
                } else {
                    JsonValue::String(field.to_string())
                };
                (name.clone(), value)
            })
            .collect();
        records.push(record);
    }

    Ok(records)
}
