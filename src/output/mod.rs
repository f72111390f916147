//! Output module
//!
//! Handles the side artifacts of a successful load.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing a batch to a `;`-delimited CSV archive named by entity and day
//! - Maintaining the pointer file that records the latest archive path
//! - Reading an archive back for replay
//! - Uploading archives to S3-compatible object storage

mod archive;
mod cloud;

pub use archive::{read_archive, Archiver};
pub use cloud::{build_object_store, object_key, Uploader};
