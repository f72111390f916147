// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Chicago Crash ETL
//!
//! Pulls traffic-crash datasets from the City of Chicago open-data portal,
//! loads them into a relational table, archives each batch as CSV and
//! uploads the archive to S3-compatible object storage.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chicago_crash_etl::{config::AppConfig, entity::load_entity, pipeline::Pipeline, Result};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env("./storage", None)?;
//!     let pipeline = Pipeline::from_config(&config)?;
//!
//!     let people = load_entity("people")?;
//!     let report = pipeline.run(&people).await;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  Pipeline (one per entity run)                   │
//! │   fetch → normalize → load → archive → upload  →  RunReport      │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────┬───┴────────────┬────────────┬─────────┐
//! │   HTTP    │  Normalize   │   Database     │  Archive   │ Upload  │
//! ├───────────┼──────────────┼────────────────┼────────────┼─────────┤
//! │ JSON feed │ Whitelist    │ DuckDB file    │ CSV (;)    │ S3/COS  │
//! │ One GET   │ Coerce types │ Postgres attach│ Pointer    │ .keep   │
//! │           │ Required ids │ One transaction│ file       │ marker  │
//! └───────────┴──────────────┴────────────────┴────────────┴─────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Process configuration from the environment
pub mod config;

/// Column schemas, SQL rendering and value coercion
pub mod schema;

/// Entity descriptors and built-in entities
pub mod entity;

/// HTTP client and feed fetcher
pub mod http;

/// Record normalization
pub mod normalize;

/// Database loading via DuckDB
pub mod database;

/// CSV archives and object-storage upload
pub mod output;

/// Stage orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use entity::{load_entity, EntityDescriptor};
pub use pipeline::{Pipeline, RunEnd, RunReport, UploadOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
