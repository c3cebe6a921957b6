//! Configuration module
//!
//! Settings are read from the process environment (after loading a `.env` file if
//! one exists). Numeric settings fall back to their defaults when missing or
//! unparseable; required settings and cross-field rules are enforced by
//! [`Config::validate`].

use std::env;

use crate::constants::DEFAULT_MAX_TAGS;
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_MAX_WORKERS: usize = 4;
const UPLOAD_QUEUE_CAPACITY: usize = 64;
const UPLOAD_STATUS_TTL_SECS: u64 = 3600;
const UPLOAD_STATUS_REAP_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload pipeline
    pub max_tags_per_file: usize,
    pub upload_max_workers: usize,
    pub upload_queue_capacity: usize,
    pub upload_status_ttl_secs: u64,
    pub upload_status_reap_interval_secs: u64,
    pub upload_status_evict_on_read: bool,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(s) => Some(s.parse::<StorageBackend>()?),
            None => None,
        };

        let config = Config {
            environment,
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            max_tags_per_file: lookup("MAX_TAGS_PER_FILE")
                .unwrap_or_else(|| DEFAULT_MAX_TAGS.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_TAGS),
            upload_max_workers: lookup("UPLOAD_MAX_WORKERS")
                .unwrap_or_else(|| UPLOAD_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(UPLOAD_MAX_WORKERS),
            upload_queue_capacity: lookup("UPLOAD_QUEUE_CAPACITY")
                .unwrap_or_else(|| UPLOAD_QUEUE_CAPACITY.to_string())
                .parse()
                .unwrap_or(UPLOAD_QUEUE_CAPACITY),
            upload_status_ttl_secs: lookup("UPLOAD_STATUS_TTL_SECS")
                .unwrap_or_else(|| UPLOAD_STATUS_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_STATUS_TTL_SECS),
            upload_status_reap_interval_secs: lookup("UPLOAD_STATUS_REAP_INTERVAL_SECS")
                .unwrap_or_else(|| UPLOAD_STATUS_REAP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_STATUS_REAP_INTERVAL_SECS),
            upload_status_evict_on_read: lookup("UPLOAD_STATUS_EVICT_ON_READ")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            log_format: lookup("LOG_FORMAT")
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_tags_per_file == 0 {
            return Err(anyhow::anyhow!("MAX_TAGS_PER_FILE must be greater than 0"));
        }

        if self.upload_max_workers == 0 || self.upload_queue_capacity == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_MAX_WORKERS and UPLOAD_QUEUE_CAPACITY must be greater than 0"
            ));
        }

        if self.log_format != "text" && self.log_format != "json" {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'text' or 'json'"));
        }

        match self.storage_backend() {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "memory storage backend cannot be used in production"
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend.unwrap_or(StorageBackend::S3)
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn max_tags_per_file(&self) -> usize {
        self.max_tags_per_file
    }

    pub fn upload_max_workers(&self) -> usize {
        self.upload_max_workers
    }

    pub fn upload_queue_capacity(&self) -> usize {
        self.upload_queue_capacity
    }

    pub fn upload_status_ttl_secs(&self) -> u64 {
        self.upload_status_ttl_secs
    }

    pub fn upload_status_reap_interval_secs(&self) -> u64 {
        self.upload_status_reap_interval_secs
    }

    pub fn upload_status_evict_on_read(&self) -> bool {
        self.upload_status_evict_on_read
    }

    pub fn log_format(&self) -> &str {
        &self.log_format
    }
}
