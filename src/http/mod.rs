//! HTTP module
//!
//! Provides the HTTP client and the feed fetcher.
//!
//! # Features
//!
//! - **Single GET**: one request per run, no pagination and no retries
//! - **Status Classification**: non-success responses become `Error::HttpStatus`
//! - **Record Decoding**: the body must be a JSON array of flat objects

mod client;
mod fetcher;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use fetcher::{decode_records, FeedFetcher, RecordSource};
