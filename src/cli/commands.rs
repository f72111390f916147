//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chicago crash ETL
#[derive(Parser, Debug)]
#[command(name = "chicago-crash-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory for archive and pointer files
    #[arg(short, long, global = true, default_value = "./storage")]
    pub storage: PathBuf,

    /// Load into a local DuckDB file instead of the configured database
    #[arg(long, global = true)]
    pub duckdb: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the pipeline for one entity
    Run {
        /// Built-in entity name or descriptor file (YAML)
        entity: PathBuf,
    },

    /// Run every built-in entity
    RunAll,

    /// Load the latest archive of an entity again
    Replay {
        /// Built-in entity name or descriptor file (YAML)
        entity: PathBuf,
    },

    /// List built-in entities
    Entities,
}
