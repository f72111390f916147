//! Process configuration
//!
//! Resolved once at start-up from environment variables and CLI flags,
//! then handed to the pipeline. Nothing below the CLI reads the
//! environment.

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default object-storage endpoint
pub const DEFAULT_COS_ENDPOINT: &str = "https://s3.us-south.cloud-object-storage.appdomain.cloud";

/// Default object-storage region
pub const DEFAULT_COS_REGION: &str = "us-south";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Everything a run needs besides the entity descriptor
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory for archive and pointer files
    pub storage_dir: PathBuf,

    /// Target database
    pub database: DatabaseConfig,

    /// Object storage; `None` disables uploads
    pub upload: Option<UploadConfig>,

    /// HTTP client settings for the feed
    pub http: HttpClientConfig,
}

impl AppConfig {
    /// Resolve configuration from the process environment
    pub fn from_env(storage_dir: impl Into<PathBuf>, duckdb_path: Option<PathBuf>) -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars, storage_dir, duckdb_path)
    }

    /// Resolve configuration from a variable map
    ///
    /// An explicit `duckdb_path` takes precedence over `DB_ENGINE`.
    pub fn from_vars(
        vars: &HashMap<String, String>,
        storage_dir: impl Into<PathBuf>,
        duckdb_path: Option<PathBuf>,
    ) -> Result<Self> {
        let storage_dir = storage_dir.into();

        let database = match duckdb_path {
            Some(path) => DatabaseConfig::DuckDb { path },
            None => DatabaseConfig::from_vars(vars, &storage_dir)?,
        };

        Ok(Self {
            database,
            upload: UploadConfig::from_vars(vars)?,
            http: HttpClientConfig::default(),
            storage_dir,
        })
    }
}

fn var<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn var_or(vars: &HashMap<String, String>, key: &str, default: &str) -> String {
    var(vars, key).unwrap_or(default).to_string()
}

// ============================================================================
// Database Config
// ============================================================================

/// Target database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// PostgreSQL, reached through DuckDB's postgres extension
    Postgres(PostgresConfig),
    /// Local DuckDB database file
    DuckDb { path: PathBuf },
}

impl DatabaseConfig {
    /// Resolve from `DB_ENGINE`, `DB_PATH`, `DB_HOST`, `DB_PORT`, `DB_NAME`,
    /// `DB_USER`, `DB_PASSWORD` and `DB_SSLMODE`
    pub fn from_vars(vars: &HashMap<String, String>, storage_dir: &Path) -> Result<Self> {
        let engine = var_or(vars, "DB_ENGINE", "postgres").to_lowercase();
        match engine.as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres(PostgresConfig::from_vars(vars)?)),
            "duckdb" => {
                let path = var(vars, "DB_PATH")
                    .map_or_else(|| storage_dir.join("crashes.duckdb"), PathBuf::from);
                Ok(Self::DuckDb { path })
            }
            other => Err(Error::invalid_value(
                "DB_ENGINE",
                format!("expected 'postgres' or 'duckdb', got '{other}'"),
            )),
        }
    }
}

/// PostgreSQL connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: "prefer".to_string(),
        }
    }
}

impl PostgresConfig {
    fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match var(vars, "DB_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::invalid_value("DB_PORT", e.to_string()))?,
            None => defaults.port,
        };

        Ok(Self {
            host: var_or(vars, "DB_HOST", &defaults.host),
            port,
            database: var_or(vars, "DB_NAME", &defaults.database),
            user: var_or(vars, "DB_USER", &defaults.user),
            password: vars.get("DB_PASSWORD").cloned().unwrap_or_default(),
            ssl_mode: var_or(vars, "DB_SSLMODE", &defaults.ssl_mode),
        })
    }
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"****")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

// ============================================================================
// Upload Config
// ============================================================================

/// S3-compatible object storage credentials and location
///
/// Only HMAC credentials are supported. An IBM Cloud API key cannot be
/// used directly; create HMAC keys for the service instance instead.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    /// HMAC access key id
    pub access_key_id: String,
    /// HMAC secret access key
    pub secret_access_key: String,
    /// Sent as `ibm-service-instance-id` when set
    pub service_instance_id: Option<String>,
}

impl UploadConfig {
    /// Resolve from `COS_*` variables; `None` when `COS_BUCKET` is unset
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Option<Self>> {
        let Some(bucket) = var(vars, "COS_BUCKET") else {
            return Ok(None);
        };

        let access_key_id = var(vars, "COS_ACCESS_KEY_ID")
            .ok_or_else(|| Error::missing_field("COS_ACCESS_KEY_ID"))?;
        let secret_access_key = var(vars, "COS_SECRET_ACCESS_KEY")
            .ok_or_else(|| Error::missing_field("COS_SECRET_ACCESS_KEY"))?;

        let endpoint = var_or(vars, "COS_ENDPOINT", DEFAULT_COS_ENDPOINT);
        url::Url::parse(&endpoint)
            .map_err(|e| Error::invalid_value("COS_ENDPOINT", e.to_string()))?;

        Ok(Some(Self {
            bucket: bucket.to_string(),
            endpoint,
            region: var_or(vars, "COS_REGION", DEFAULT_COS_REGION),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            service_instance_id: var(vars, "COS_SERVICE_INSTANCE_ID").map(String::from),
        }))
    }
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .field("service_instance_id", &self.service_instance_id)
            .finish()
    }
}
