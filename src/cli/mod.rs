//! CLI module
//!
//! Command-line interface for running entity pipelines.
//!
//! # Commands
//!
//! - `run` - Fetch, load, archive and upload one entity
//! - `run-all` - Run every built-in entity in order
//! - `replay` - Load an entity's latest archive again
//! - `entities` - List built-in entities

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
