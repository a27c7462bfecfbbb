//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use reelhouse_core::Config;

/// Validate critical configuration values and warn about risky ones.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    let ingest = config.ingest();
    if ingest.reconciliation_log_path.is_none() {
        tracing::warn!(
            orphan_policy = %ingest.orphan_policy,
            "RECONCILIATION_LOG_PATH not set; orphaned objects are only reported in logs"
        );
    }

    if ingest.max_video_size_bytes > 5 * 1024 * 1024 * 1024 {
        tracing::warn!(
            max_video_mb = ingest.max_video_size_bytes / 1024 / 1024,
            "MAX_VIDEO_SIZE_MB is very large - ensure the staging directory has room"
        );
    }

    if ingest.assets_base_url.starts_with("http://") && is_production {
        tracing::warn!(
            assets_base_url = %ingest.assets_base_url,
            "ASSETS_BASE_URL uses plain HTTP in production"
        );
    }

    Ok(())
}
