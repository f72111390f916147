//! Per-run outcome types

use std::path::{Path, PathBuf};

/// Result of the optional upload stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No object storage configured
    Disabled,
    /// File stored under `key`
    Uploaded { key: String },
    /// Upload failed; earlier stages are unaffected
    Failed { error: String },
}

/// Where a run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// The feed could not be fetched or decoded
    FetchFailed { error: String },
    /// The feed returned no records
    EmptyFeed,
    /// Every record lacked a required identifier
    NoValidRecords,
    /// Connection or statement failure; the batch was rolled back
    LoadFailed { error: String },
    /// The loader reported zero inserted rows
    NothingInserted,
    /// The archive or pointer file could not be written; the load stays committed
    ArchiveFailed { error: String },
    /// Rows were loaded and archived
    Archived { path: PathBuf, upload: UploadOutcome },
    /// The pointer file or the archive it names could not be read
    ArchiveUnavailable { error: String },
    /// An archived batch was loaded again
    Replayed { path: PathBuf },
}

/// Summary of one pipeline run for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub entity: String,
    /// Raw records received
    pub fetched: usize,
    /// Records surviving normalization
    pub normalized: usize,
    /// Rows committed to the table
    pub inserted: usize,
    pub end: RunEnd,
}

impl RunReport {
    pub(crate) fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fetched: 0,
            normalized: 0,
            inserted: 0,
            end: RunEnd::EmptyFeed,
        }
    }

    pub(crate) fn finish(mut self, end: RunEnd) -> Self {
        self.end = end;
        self
    }

    /// Records dropped by the normalizer
    pub fn dropped(&self) -> usize {
        self.fetched.saturating_sub(self.normalized)
    }

    /// Path of the archive written or replayed by this run
    pub fn archive_path(&self) -> Option<&Path> {
        match &self.end {
            RunEnd::Archived { path, .. } | RunEnd::Replayed { path } => Some(path),
            _ => None,
        }
    }

    /// Upload outcome, if the run got that far
    pub fn upload(&self) -> Option<&UploadOutcome> {
        match &self.end {
            RunEnd::Archived { upload, .. } => Some(upload),
            _ => None,
        }
    }

    /// Whether any stage failed
    pub fn has_failure(&self) -> bool {
        matches!(
            self.end,
            RunEnd::FetchFailed { .. }
                | RunEnd::LoadFailed { .. }
                | RunEnd::ArchiveFailed { .. }
                | RunEnd::ArchiveUnavailable { .. }
                | RunEnd::Archived {
                    upload: UploadOutcome::Failed { .. },
                    ..
                }
        )
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: fetched={} normalized={} inserted={} ",
            self.entity, self.fetched, self.normalized, self.inserted
        )?;
        match &self.end {
            RunEnd::FetchFailed { error } => write!(f, "fetch failed: {error}"),
            RunEnd::EmptyFeed => write!(f, "no data from feed"),
            RunEnd::NoValidRecords => write!(f, "no valid records"),
            RunEnd::LoadFailed { error } => write!(f, "load failed: {error}"),
            RunEnd::NothingInserted => write!(f, "nothing inserted"),
            RunEnd::ArchiveFailed { error } => write!(f, "archive failed: {error}"),
            RunEnd::Archived { path, upload } => {
                write!(f, "archived to {}", path.display())?;
                match upload {
                    UploadOutcome::Disabled => Ok(()),
                    UploadOutcome::Uploaded { key } => write!(f, ", uploaded as {key}"),
                    UploadOutcome::Failed { error } => write!(f, ", upload failed: {error}"),
                }
            }
            RunEnd::ArchiveUnavailable { error } => write!(f, "archive unavailable: {error}"),
            RunEnd::Replayed { path } => write!(f, "replayed {}", path.display()),
        }
    }
}
