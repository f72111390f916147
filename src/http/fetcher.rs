//! Feed fetcher
//!
//! One GET against the entity's feed URL, decoded into flat records.

use super::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::{JsonValue, RawRecord};
use async_trait::async_trait;
use tracing::info;

/// Source of raw records for a pipeline run
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record the feed currently returns
    async fn fetch(&self, url: &str) -> Result<Vec<RawRecord>>;
}

/// Fetches records from a JSON HTTP feed
#[derive(Debug)]
pub struct FeedFetcher {
    client: HttpClient,
}

impl FeedFetcher {
    /// Create a fetcher over the given client
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawRecord>> {
        let body = self.client.get_text(url).await?;
        let records = decode_records(&body)?;
        info!("Fetched {} records from {}", records.len(), url);
        Ok(records)
    }
}

/// Decode a response body into a list of flat records
///
/// The body must be a JSON array whose items are all objects.
pub fn decode_records(body: &str) -> Result<Vec<RawRecord>> {
    let value: JsonValue = serde_json::from_str(body)
        .map_err(|e| Error::decode(format!("Response is not valid JSON: {e}")))?;

    let JsonValue::Array(items) = value else {
        return Err(Error::decode("Expected a JSON array of records"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            JsonValue::Object(record) => Ok(record),
            other => Err(Error::decode(format!(
                "Record {idx} is not an object: {other}"
            ))),
        })
        .collect()
}
