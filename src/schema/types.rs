//! Schema types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// SQL column type of a target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    /// Unconstrained text, the type of every unmapped column
    #[default]
    Text,
    Integer,
    Double,
    /// Fixed-point decimal with precision and scale
    Decimal { precision: u8, scale: u8 },
    Timestamp,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "text" | "string" | "varchar" => return Ok(ColumnType::Text),
            "integer" | "int" | "bigint" => return Ok(ColumnType::Integer),
            "double" | "double precision" | "float" => return Ok(ColumnType::Double),
            "timestamp" | "datetime" => return Ok(ColumnType::Timestamp),
            _ => {}
        }

        let args = normalized
            .strip_prefix("decimal(")
            .or_else(|| normalized.strip_prefix("numeric("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| Error::config(format!("Unknown column type: {s}")))?;

        let (precision, scale) = args
            .split_once(',')
            .ok_or_else(|| Error::config(format!("Decimal type needs precision and scale: {s}")))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("Invalid decimal precision in '{s}'")))?;
        let scale: u8 = scale
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("Invalid decimal scale in '{s}'")))?;

        if precision == 0 || scale > precision {
            return Err(Error::config(format!("Invalid decimal bounds in '{s}'")));
        }

        Ok(ColumnType::Decimal { precision, scale })
    }
}

impl TryFrom<String> for ColumnType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

/// One column of a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Lower-case column name; also the whitelisted feed field
    pub name: String,

    /// Column type
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,

    /// Required identifier: records without it are dropped, column is NOT NULL
    #[serde(default)]
    pub required: bool,
}

impl ColumnDef {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into().to_lowercase(),
            column_type,
            required: false,
        }
    }

    /// Create a required (non-null) column
    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            required: true,
            ..Self::new(name, column_type)
        }
    }

    /// Check if the column accepts nulls
    pub fn is_nullable(&self) -> bool {
        !self.required
    }
}

/// Ordered column set of a target table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Create a schema from an ordered column list
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// All columns, in order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Column names, in order; this is the field whitelist
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        let name = name.to_lowercase();
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column type for a field, `Text` when the field is not in the schema
    pub fn column_type(&self, name: &str) -> ColumnType {
        self.column(name).map(|c| c.column_type).unwrap_or_default()
    }

    /// Whether a field accepts nulls; unknown fields do
    pub fn is_nullable(&self, name: &str) -> bool {
        self.column(name).map_or(true, ColumnDef::is_nullable)
    }

    /// Names of the required identifier columns
    pub fn required_fields(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Validate column names and uniqueness
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::config("Schema must have at least one column"));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            super::validate_identifier(&column.name)?;
            if !seen.insert(column.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate column in schema: {}",
                    column.name
                )));
            }
        }

        Ok(())
    }
}
