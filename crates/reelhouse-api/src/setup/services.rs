//! Service and repository wiring

use crate::services::ingest::{IngestionService, ReconciliationLog};
use crate::state::AppState;
use anyhow::{Context, Result};
use reelhouse_core::Config;
use reelhouse_db::PgMediaRepository;
use reelhouse_processing::{FfmpegNormalizer, FfprobeProber};
use reelhouse_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Build the ingestion pipeline and the shared application state
pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let settings = config.ingest().clone();

    tokio::fs::create_dir_all(&settings.staging_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                settings.staging_dir.display()
            )
        })?;

    let prober = FfprobeProber::new(config.ffprobe_path(), settings.probe_timeout)
        .context("Invalid FFPROBE_PATH")?;
    let normalizer = FfmpegNormalizer::new(config.ffmpeg_path(), settings.transcode_timeout)
        .context("Invalid FFMPEG_PATH")?;

    let reconciliation = ReconciliationLog::new(settings.reconciliation_log_path.clone());

    tracing::info!(
        staging_dir = %settings.staging_dir.display(),
        max_video_mb = settings.max_video_size_bytes / 1024 / 1024,
        max_thumbnail_mb = settings.max_thumbnail_size_bytes / 1024 / 1024,
        orphan_policy = %settings.orphan_policy,
        ffmpeg_path = %config.ffmpeg_path(),
        ffprobe_path = %config.ffprobe_path(),
        "Ingestion pipeline configured"
    );

    let ingest = IngestionService::new(
        Arc::new(PgMediaRepository::new(pool)),
        storage,
        assets,
        Arc::new(prober),
        Arc::new(normalizer),
        settings,
        reconciliation,
    );

    Ok(Arc::new(AppState {
        ingest: Arc::new(ingest),
    }))
}
