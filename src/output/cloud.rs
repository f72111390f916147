//! Object storage upload (S3-compatible)

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore};
use reqwest::header::{HeaderMap, HeaderValue};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the zero-byte object that materializes a folder
const FOLDER_MARKER: &str = ".keep";

/// Build an S3 client for the configured bucket
pub fn build_object_store(config: &UploadConfig) -> Result<Arc<dyn ObjectStore>> {
    let mut options = ClientOptions::new();
    if let Some(instance_id) = &config.service_instance_id {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(instance_id)
            .map_err(|e| Error::invalid_value("COS_SERVICE_INSTANCE_ID", e.to_string()))?;
        headers.insert("ibm-service-instance-id", value);
        options = options.with_default_headers(headers);
    }

    let store = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_endpoint(&config.endpoint)
        .with_region(&config.region)
        .with_access_key_id(&config.access_key_id)
        .with_secret_access_key(&config.secret_access_key)
        .with_client_options(options)
        .build()
        .map_err(|e| Error::config(format!("Failed to create object storage client: {e}")))?;

    Ok(Arc::new(store))
}

/// Object key of a local file inside a folder: `<folder>/<basename>`
pub fn object_key(folder: &str, local_path: &Path) -> Result<String> {
    let file_name = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::upload(format!("Invalid file name: {}", local_path.display())))?;

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        Ok(file_name.to_string())
    } else {
        Ok(format!("{folder}/{file_name}"))
    }
}

/// Uploads archive files into folders of a bucket
#[derive(Debug, Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Uploader {
    /// Create an uploader over any object store
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Create an uploader from configuration
    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        Ok(Self::new(build_object_store(config)?, config.bucket.clone()))
    }

    /// Bucket name (for logging)
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the folder marker if nothing exists under `folder/`
    ///
    /// Returns whether the marker was written.
    pub async fn ensure_folder(&self, folder: &str) -> Result<bool> {
        let prefix = ObjectPath::from(folder.trim_matches('/'));

        let mut listing = self.store.list(Some(&prefix));
        match listing.next().await {
            Some(Ok(_)) => {
                debug!("Folder '{}' already exists in {}", prefix, self.bucket);
                Ok(false)
            }
            Some(Err(e)) => Err(e.into()),
            None => {
                drop(listing);
                let marker = prefix.child(FOLDER_MARKER);
                self.store.put(&marker, Bytes::new().into()).await?;
                info!("Created folder '{}' in {}", prefix, self.bucket);
                Ok(true)
            }
        }
    }

    /// Upload a local file under `folder/<basename>`, returning the key
    ///
    /// A failing folder probe is logged and the upload still proceeds.
    pub async fn upload(&self, local_path: &Path, folder: &str) -> Result<String> {
        let key = object_key(folder, local_path)?;

        if let Err(e) = self.ensure_folder(folder).await {
            warn!("Could not check or create folder '{}': {}", folder, e);
        }

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            Error::upload(format!("Failed to read {}: {e}", local_path.display()))
        })?;

        let location = ObjectPath::from(key.as_str());
        self.store
            .put(&location, Bytes::from(data).into())
            .await?;

        info!("Uploaded {} to {}/{}", local_path.display(), self.bucket, key);
        Ok(key)
    }
}
