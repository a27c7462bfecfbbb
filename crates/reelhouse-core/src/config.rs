//! Configuration module
//!
//! Configuration is read once from the environment (and an optional `.env`
//! file) at startup, validated, and then passed around as an immutable value.
//! The ingestion pipeline only sees the [`IngestSettings`] slice of it.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_ISSUER: &str = "reelhouse-access";

/// What to do with a stored object whose metadata commit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Leave the object in place and record it for out-of-band reconciliation.
    Reconcile,
    /// Attempt a compensating delete; record the object only if that fails.
    Delete,
}

impl FromStr for OrphanPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reconcile" => Ok(OrphanPolicy::Reconcile),
            "delete" => Ok(OrphanPolicy::Delete),
            _ => Err(anyhow::anyhow!(
                "Invalid ORPHAN_POLICY '{}': expected 'reconcile' or 'delete'",
                s
            )),
        }
    }
}

impl Display for OrphanPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OrphanPolicy::Reconcile => write!(f, "reconcile"),
            OrphanPolicy::Delete => write!(f, "delete"),
        }
    }
}

/// Settings injected into the ingestion orchestrator.
#[derive(Clone, Debug)]
pub struct IngestSettings {
    /// Ceiling on a video upload body, checked against the declared length and while streaming.
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    /// Directory that holds staged and normalized upload files.
    pub staging_dir: PathBuf,
    /// Prefix of every video reference URL; the storage key is appended to it.
    pub distribution_base_url: String,
    /// Prefix of every thumbnail reference URL; the asset filename is appended to it.
    pub assets_base_url: String,
    pub probe_timeout: Duration,
    pub transcode_timeout: Duration,
    /// Extra attempts made for the metadata commit after the first one fails.
    pub metadata_commit_retries: u32,
    pub metadata_commit_backoff: Duration,
    pub orphan_policy: OrphanPolicy,
    pub reconciliation_log_path: Option<PathBuf>,
}

/// Base configuration for the HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub environment: String,
    pub log_format: String,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub run_migrations: bool,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub assets_root: PathBuf,
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub ingest: IngestSettings,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }
    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }
    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }
    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }
    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }
    pub fn jwt_issuer(&self) -> &str {
        &self.inner().base.jwt_issuer
    }
    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }
    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }
    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }
    pub fn run_migrations(&self) -> bool {
        self.inner().run_migrations
    }
    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }
    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }
    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }
    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }
    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }
    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }
    pub fn assets_root(&self) -> &std::path::Path {
        &self.inner().assets_root
    }
    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }
    pub fn ffprobe_path(&self) -> &str {
        &self.inner().ffprobe_path
    }
    pub fn ingest(&self) -> &IngestSettings {
        &self.inner().ingest
    }
    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().ingest.max_video_size_bytes
    }
    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.inner().ingest.max_thumbnail_size_bytes
    }
}

/// Reference prefix for stored videos when `DISTRIBUTION_BASE_URL` is not set.
fn default_distribution_base(
    backend: StorageBackend,
    bucket: Option<&str>,
    region: Option<&str>,
    endpoint: Option<&str>,
    local_base_url: Option<&str>,
) -> Option<String> {
    match backend {
        StorageBackend::S3 => {
            let bucket = bucket?;
            match endpoint {
                Some(endpoint) => Some(format!("{}/{}", endpoint.trim_end_matches('/'), bucket)),
                None => Some(format!("https://{}.s3.{}.amazonaws.com", bucket, region?)),
            }
        }
        StorageBackend::Local => local_base_url.map(|url| url.trim_end_matches('/').to_string()),
    }
}

/// Convert a size in megabytes to bytes, `None` if it does not fit in a `u64`.
fn megabytes_to_bytes(megabytes: u64) -> Option<u64> {
    megabytes.checked_mul(1024 * 1024)
}

/// Read an upload ceiling given in megabytes, falling back to `default_mb` when unset or unparsable.
fn size_limit_from_env(name: &str, default_mb: u64) -> Result<u64, anyhow::Error> {
    let megabytes = env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_mb);
    megabytes_to_bytes(megabytes)
        .ok_or_else(|| anyhow::anyhow!("{} is out of range: {} MB", name, megabytes))
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_VIDEO_SIZE_MB: u64 = 1024;
        const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
        const PROBE_TIMEOUT_SECS: u64 = 30;
        const TRANSCODE_TIMEOUT_SECS: u64 = 600;
        const METADATA_COMMIT_RETRIES: u32 = 2;
        const METADATA_COMMIT_BACKOFF_MS: u64 = 200;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| JWT_ISSUER.to_string()),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase(),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let s3_bucket = env::var("S3_BUCKET").ok().filter(|s| !s.is_empty());
        let s3_region = env::var("S3_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .ok()
            .filter(|s| !s.is_empty());
        let s3_endpoint = env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty());
        let local_storage_path = env::var("LOCAL_STORAGE_PATH").ok();
        let local_storage_base_url = env::var("LOCAL_STORAGE_BASE_URL").ok();

        let distribution_base_url = env::var("DISTRIBUTION_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .or_else(|| {
                default_distribution_base(
                    storage_backend,
                    s3_bucket.as_deref(),
                    s3_region.as_deref(),
                    s3_endpoint.as_deref(),
                    local_storage_base_url.as_deref(),
                )
            })
            .unwrap_or_default();

        let ingest = IngestSettings {
            max_video_size_bytes: size_limit_from_env("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)?,
            max_thumbnail_size_bytes: size_limit_from_env(
                "MAX_THUMBNAIL_SIZE_MB",
                MAX_THUMBNAIL_SIZE_MB,
            )?,
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            distribution_base_url,
            assets_base_url: env::var("ASSETS_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", server_port)),
            probe_timeout: Duration::from_secs(
                env::var("PROBE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| PROBE_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(PROBE_TIMEOUT_SECS),
            ),
            transcode_timeout: Duration::from_secs(
                env::var("TRANSCODE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| TRANSCODE_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            ),
            metadata_commit_retries: env::var("METADATA_COMMIT_RETRIES")
                .unwrap_or_else(|_| METADATA_COMMIT_RETRIES.to_string())
                .parse()
                .unwrap_or(METADATA_COMMIT_RETRIES),
            metadata_commit_backoff: Duration::from_millis(
                env::var("METADATA_COMMIT_BACKOFF_MS")
                    .unwrap_or_else(|_| METADATA_COMMIT_BACKOFF_MS.to_string())
                    .parse()
                    .unwrap_or(METADATA_COMMIT_BACKOFF_MS),
            ),
            orphan_policy: match env::var("ORPHAN_POLICY") {
                Ok(value) => value.parse()?,
                Err(_) => OrphanPolicy::Reconcile,
            },
            reconciliation_log_path: env::var("RECONCILIATION_LOG_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        let config = ServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            run_migrations: env::var("RUN_MIGRATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            storage_backend,
            s3_bucket,
            s3_region,
            s3_endpoint,
            local_storage_path,
            local_storage_base_url,
            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./assets")),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ingest,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        let is_production = {
            let env = self.base.environment.to_lowercase();
            env == "production" || env == "prod"
        };
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
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
        }

        if self.ingest.distribution_base_url.is_empty() {
            return Err(anyhow::anyhow!(
                "DISTRIBUTION_BASE_URL could not be derived; set it explicitly"
            ));
        }

        if self.ingest.max_video_size_bytes == 0 || self.ingest.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size ceilings must be greater than 0"));
        }

        if self.ingest.probe_timeout.is_zero() || self.ingest.transcode_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "PROBE_TIMEOUT_SECS and TRANSCODE_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        Ok(())
    }
}
