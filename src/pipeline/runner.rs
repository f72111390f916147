//! Stage orchestration

use super::outcome::{RunEnd, RunReport, UploadOutcome};
use crate::config::AppConfig;
use crate::database::{DatabaseLoader, RecordSink};
use crate::entity::EntityDescriptor;
use crate::error::Result;
use crate::http::{FeedFetcher, HttpClient, RecordSource};
use crate::normalize::{Batch, Normalizer};
use crate::output::{read_archive, Archiver, Uploader};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs entities through fetch, normalize, load, archive and upload
pub struct Pipeline {
    source: Box<dyn RecordSource>,
    sink: Box<dyn RecordSink>,
    archiver: Archiver,
    uploader: Option<Uploader>,
}

impl Pipeline {
    /// Assemble a pipeline from its stages; uploads are disabled
    pub fn new(
        source: impl RecordSource + 'static,
        sink: impl RecordSink + 'static,
        archiver: Archiver,
    ) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
            archiver,
            uploader: None,
        }
    }

    /// Enable the upload stage
    #[must_use]
    pub fn with_uploader(mut self, uploader: Uploader) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Build the production pipeline from resolved configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http.clone())?;
        let pipeline = Self::new(
            FeedFetcher::new(client),
            DatabaseLoader::new(config.database.clone()),
            Archiver::new(&config.storage_dir),
        );

        match &config.upload {
            Some(upload) => Ok(pipeline.with_uploader(Uploader::from_config(upload)?)),
            None => Ok(pipeline),
        }
    }

    /// Archive location
    pub fn archiver(&self) -> &Archiver {
        &self.archiver
    }

    /// Run one entity, stamping the archive with today's local date
    pub async fn run(&self, entity: &EntityDescriptor) -> RunReport {
        self.run_on(entity, chrono::Local::now().date_naive()).await
    }

    /// Run one entity with an explicit archive date
    pub async fn run_on(&self, entity: &EntityDescriptor, date: NaiveDate) -> RunReport {
        let span = info_span!("run", entity = %entity.name);
        let report = self.execute(entity, date).instrument(span).await;
        info!("{}", report);
        report
    }

    async fn execute(&self, entity: &EntityDescriptor, date: NaiveDate) -> RunReport {
        let mut report = RunReport::new(&entity.name);

        // Fetch
        info!("Fetching {}", entity.feed_url);
        let raw = match self.source.fetch(&entity.feed_url).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Fetch failed: {}", e);
                return report.finish(RunEnd::FetchFailed {
                    error: e.to_string(),
                });
            }
        };
        report.fetched = raw.len();
        if raw.is_empty() {
            info!("No data from feed");
            return report.finish(RunEnd::EmptyFeed);
        }

        // Normalize
        let batch = Normalizer::new(&entity.schema).normalize(&raw);
        report.normalized = batch.len();
        if batch.is_empty() {
            warn!("No valid records after normalization");
            return report.finish(RunEnd::NoValidRecords);
        }

        // Load
        match self.load(&batch, entity) {
            Ok(0) => return report.finish(RunEnd::NothingInserted),
            Ok(inserted) => report.inserted = inserted,
            Err(end) => return report.finish(end),
        }

        // Archive
        let path = match self.archiver.archive(&batch, entity, date) {
            Ok(path) => path,
            Err(e) => {
                error!("Archive failed: {}", e);
                return report.finish(RunEnd::ArchiveFailed {
                    error: e.to_string(),
                });
            }
        };

        // Upload
        let upload = self.upload(&path, entity).await;
        report.finish(RunEnd::Archived { path, upload })
    }

    /// Load an entity's most recent archive again
    ///
    /// Reads the pointer file, normalizes the archived rows and inserts them.
    /// Nothing is fetched, archived or uploaded.
    pub fn replay(&self, entity: &EntityDescriptor) -> RunReport {
        let _span = info_span!("replay", entity = %entity.name).entered();
        let mut report = RunReport::new(&entity.name);

        let (path, raw) = match self
            .archiver
            .latest_archive(entity)
            .and_then(|path| read_archive(&path).map(|raw| (path, raw)))
        {
            Ok(found) => found,
            Err(e) => {
                error!("Cannot read archive: {}", e);
                return report.finish(RunEnd::ArchiveUnavailable {
                    error: e.to_string(),
                });
            }
        };
        info!("Replaying {}", path.display());

        report.fetched = raw.len();
        if raw.is_empty() {
            return report.finish(RunEnd::EmptyFeed);
        }

        let batch = Normalizer::new(&entity.schema).normalize(&raw);
        report.normalized = batch.len();
        if batch.is_empty() {
            warn!("No valid records in archive");
            return report.finish(RunEnd::NoValidRecords);
        }

        let end = match self.load(&batch, entity) {
            Ok(0) => RunEnd::NothingInserted,
            Ok(inserted) => {
                report.inserted = inserted;
                RunEnd::Replayed { path }
            }
            Err(end) => end,
        };
        let report = report.finish(end);
        info!("{}", report);
        report
    }

    fn load(&self, batch: &Batch, entity: &EntityDescriptor) -> std::result::Result<usize, RunEnd> {
        match self.sink.load(batch, &entity.table, &entity.schema) {
            Ok(0) => {
                warn!("Nothing inserted into {}", entity.table);
                Ok(0)
            }
            Ok(inserted) => Ok(inserted),
            Err(e) => {
                error!("Load into {} failed: {}", entity.table, e);
                Err(RunEnd::LoadFailed {
                    error: e.to_string(),
                })
            }
        }
    }

    async fn upload(&self, path: &Path, entity: &EntityDescriptor) -> UploadOutcome {
        let Some(uploader) = &self.uploader else {
            return UploadOutcome::Disabled;
        };

        match uploader.upload(path, entity.folder()).await {
            Ok(key) => UploadOutcome::Uploaded { key },
            Err(e) => {
                error!("Upload to {} failed: {}", uploader.bucket(), e);
                UploadOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("archiver", &self.archiver)
            .field("upload", &self.uploader.as_ref().map(Uploader::bucket))
            .finish_non_exhaustive()
    }
}
