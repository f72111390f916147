//! Entity descriptor and YAML loading

use super::builtin;
use crate::error::{Error, Result};
use crate::schema::{validate_identifier, TableSchema};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the pipeline needs to know about one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Short entity name used in file names (e.g. "people")
    pub name: String,

    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,

    /// JSON feed returning an array of flat records
    pub feed_url: String,

    /// Target table
    pub table: String,

    /// Prefix of archive file names
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Logical folder in the bucket
    pub upload_folder: String,

    /// Whitelisted fields with their column types
    #[serde(rename = "columns")]
    pub schema: TableSchema,
}

fn default_archive_prefix() -> String {
    "chicago_reportCrash".to_string()
}

impl EntityDescriptor {
    /// Archive file name for a given day: `<prefix>_<entity>_<YYYY_MM_DD>.csv`
    pub fn archive_file_name(&self, date: NaiveDate) -> String {
        format!(
            "{}_{}_{}.csv",
            self.archive_prefix,
            self.name,
            date.format("%Y_%m_%d")
        )
    }

    /// Name of the file recording the latest archive path
    pub fn pointer_file_name(&self) -> String {
        format!("csv_path_{}.txt", self.name)
    }

    /// Upload folder without leading or trailing slashes
    pub fn folder(&self) -> &str {
        self.upload_folder.trim_matches('/')
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.name)
            .map_err(|_| Error::config(format!("Invalid entity name: '{}'", self.name)))?;

        url::Url::parse(&self.feed_url)?;
        validate_identifier(&self.table)?;

        if self.archive_prefix.is_empty()
            || self.archive_prefix.contains(['/', '\\'])
        {
            return Err(Error::config(format!(
                "Entity '{}' has an invalid archive prefix",
                self.name
            )));
        }

        if self.folder().is_empty() {
            return Err(Error::config(format!(
                "Entity '{}' upload_folder cannot be empty",
                self.name
            )));
        }

        self.schema.validate()?;

        if self.schema.required_fields().is_empty() {
            return Err(Error::config(format!(
                "Entity '{}' must mark at least one identifier column as required",
                self.name
            )));
        }

        Ok(())
    }
}

/// Load an entity from a built-in name or a YAML file path
pub fn load_entity(name_or_path: impl AsRef<Path>) -> Result<EntityDescriptor> {
    let path = name_or_path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        return match builtin::get_builtin(&path_str) {
            Some(yaml) => load_entity_from_str(yaml),
            None => Err(Error::UnknownEntity {
                name: format!(
                    "{path_str} (built-in entities: {})",
                    builtin::list_builtin().join(", ")
                ),
            }),
        };
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read entity file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_entity_from_str(&content)
}

/// Load an entity from a YAML string
pub fn load_entity_from_str(yaml: &str) -> Result<EntityDescriptor> {
    let entity: EntityDescriptor = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse entity YAML: {e}")))?;

    entity.validate()?;
    Ok(entity)
}
