//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::entity::{list_builtin, load_entity, EntityDescriptor};
use crate::error::Result;
use crate::pipeline::{Pipeline, RunReport};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// Only unusable configuration is returned as an error. Stage failures
    /// are logged and reported, never propagated.
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { entity } => {
                let entity = load_entity(entity)?;
                let pipeline = self.pipeline()?;
                pipeline.run(&entity).await;
                Ok(())
            }
            Commands::RunAll => self.run_all().await,
            Commands::Replay { entity } => {
                let entity = load_entity(entity)?;
                self.pipeline()?.replay(&entity);
                Ok(())
            }
            Commands::Entities => self.list_entities(),
        }
    }

    /// Resolve configuration and build the pipeline
    fn pipeline(&self) -> Result<Pipeline> {
        let config = AppConfig::from_env(&self.cli.storage, self.cli.duckdb.clone())?;
        info!(
            "Storage: {}, upload: {}",
            config.storage_dir.display(),
            config
                .upload
                .as_ref()
                .map_or("disabled", |u| u.bucket.as_str())
        );
        Pipeline::from_config(&config)
    }

    async fn run_all(&self) -> Result<()> {
        let entities = list_builtin()
            .into_iter()
            .map(|name| load_entity(Path::new(name)))
            .collect::<Result<Vec<EntityDescriptor>>>()?;
        let pipeline = self.pipeline()?;

        let start = Instant::now();
        let mut reports: Vec<RunReport> = Vec::with_capacity(entities.len());
        for entity in &entities {
            reports.push(pipeline.run(entity).await);
        }

        let failed = reports.iter().filter(|r| r.has_failure()).count();
        info!(
            "Finished {} entities in {:.1}s ({} with failures)",
            reports.len(),
            start.elapsed().as_secs_f64(),
            failed
        );
        Ok(())
    }

    /// List built-in entities
    fn list_entities(&self) -> Result<()> {
        let entities: Vec<Value> = list_builtin()
            .into_iter()
            .map(|name| load_entity(Path::new(name)))
            .map(|entity| {
                entity.map(|e| {
                    json!({
                        "name": e.name,
                        "title": e.title,
                        "feed_url": e.feed_url,
                        "table": e.table,
                        "folder": e.folder(),
                        "columns": e.schema.len()
                    })
                })
            })
            .collect::<Result<_>>()?;

        println!("{}", serde_json::to_string_pretty(&entities)?);
        Ok(())
    }
}
