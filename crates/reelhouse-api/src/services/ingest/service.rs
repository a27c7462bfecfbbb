use crate::services::ingest::reconciliation::{OrphanedObject, ReconciliationLog};
use crate::utils::upload::{body_read_error, parse_media_type};
use reelhouse_core::constants::{
    thumbnail_extension, THUMBNAIL_TYPES, VIDEO_CONTENT_TYPE, VIDEO_EXTENSION,
};
use reelhouse_core::{AppError, IngestSettings, MediaRecord, OrphanPolicy};
use reelhouse_db::MediaRepository;
use reelhouse_processing::{
    size_limit_exceeded, NormalizedFile, Normalizer, Prober, SizeLimitedReader, StagedFile,
    StagingError,
};
use reelhouse_storage::{derive_filename, derive_key, Storage, StorageError};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Orchestrates video and thumbnail ingestion for a media record.
pub struct IngestionService {
    repository: Arc<dyn MediaRepository>,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
    prober: Arc<dyn Prober>,
    normalizer: Arc<dyn Normalizer>,
    settings: IngestSettings,
    reconciliation: ReconciliationLog,
}

impl IngestionService {
    /// `storage` receives normalized videos; `assets` is the locally served thumbnail directory.
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        storage: Arc<dyn Storage>,
        assets: Arc<dyn Storage>,
        prober: Arc<dyn Prober>,
        normalizer: Arc<dyn Normalizer>,
        settings: IngestSettings,
        reconciliation: ReconciliationLog,
    ) -> Self {
        Self {
            repository,
            storage,
            assets,
            prober,
            normalizer,
            settings,
            reconciliation,
        }
    }

    /// Ingest a video upload and attach its reference to the media record.
    ///
    /// Nothing touches disk until the length, ownership and content type checks pass.
    /// The staged and normalized files are removed when this returns, whatever the outcome.
    #[tracing::instrument(skip_all, fields(owner_id = %owner_id, media_id = %media_id))]
    pub async fn ingest_video<R>(
        &self,
        owner_id: Uuid,
        media_id: Uuid,
        content_type: Option<&str>,
        body: R,
        declared_length: Option<u64>,
    ) -> Result<MediaRecord, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let limit = self.settings.max_video_size_bytes;
        check_declared_length(declared_length, limit)?;

        let mut record = self.authorize_owner(owner_id, media_id).await?;

        let media_type = parse_media_type(content_type)?;
        if media_type != VIDEO_CONTENT_TYPE {
            return Err(AppError::UnsupportedMediaType(format!(
                "Content type '{}' is not accepted for videos; expected {}",
                media_type, VIDEO_CONTENT_TYPE
            )));
        }

        let start = Instant::now();

        let mut staged = StagedFile::create_in(&self.settings.staging_dir, VIDEO_EXTENSION)
            .map_err(|e| staging_error(e, limit))?;
        let size_bytes = staged
            .write_from(body, limit)
            .await
            .map_err(|e| staging_error(e, limit))?;
        tracing::debug!(
            size_bytes,
            path = %staged.path().display(),
            "Upload staged"
        );

        let normalized = NormalizedFile::for_input(staged.path());
        self.normalizer
            .normalize(staged.path(), normalized.path())
            .await
            .map_err(|e| AppError::TranscodeFailure(e.to_string()))?;

        let metadata = self
            .prober
            .probe(normalized.path())
            .await
            .map_err(|e| AppError::ProbeFailure(e.to_string()))?;
        let classification = metadata.classification();
        let (width, height) = metadata.dimensions();

        let storage_key = derive_key(classification.as_str(), VIDEO_EXTENSION);
        let stored_bytes = self
            .storage
            .upload_file(&storage_key, normalized.path(), &media_type)
            .await
            .map_err(|e| AppError::StorageFailure(e.to_string()))?;

        let reference = reference_url(&self.settings.distribution_base_url, &storage_key);
        record.video_url = Some(reference.clone());
        let updated = self
            .commit_reference(&record, self.storage.as_ref(), &storage_key, &reference)
            .await?;

        tracing::info!(
            storage_key = %storage_key,
            classification = %classification,
            width,
            height,
            size_bytes = stored_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingested"
        );

        Ok(updated)
    }

    /// Ingest a jpeg or png thumbnail into the assets directory.
    #[tracing::instrument(skip_all, fields(owner_id = %owner_id, media_id = %media_id))]
    pub async fn ingest_thumbnail<R>(
        &self,
        owner_id: Uuid,
        media_id: Uuid,
        content_type: Option<&str>,
        body: R,
        declared_length: Option<u64>,
    ) -> Result<MediaRecord, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let limit = self.settings.max_thumbnail_size_bytes;
        check_declared_length(declared_length, limit)?;

        let mut record = self.authorize_owner(owner_id, media_id).await?;

        let media_type = parse_media_type(content_type)?;
        let extension = thumbnail_extension(&media_type).ok_or_else(|| {
            let accepted: Vec<&str> = THUMBNAIL_TYPES.iter().map(|(t, _)| *t).collect();
            AppError::UnsupportedMediaType(format!(
                "Content type '{}' is not accepted for thumbnails; expected one of {}",
                media_type,
                accepted.join(", ")
            ))
        })?;

        let filename = derive_filename(extension);
        let mut reader = SizeLimitedReader::new(body, limit);
        let size_bytes = self
            .assets
            .upload_stream(&filename, &media_type, &mut reader)
            .await
            .map_err(|e| asset_write_error(e, limit))?;

        let reference = reference_url(&self.settings.assets_base_url, &filename);
        record.thumbnail_url = Some(reference.clone());
        let updated = self
            .commit_reference(&record, self.assets.as_ref(), &filename, &reference)
            .await?;

        tracing::info!(
            filename = %filename,
            size_bytes,
            "Thumbnail ingested"
        );

        Ok(updated)
    }

    /// Resolve the record and check that `owner_id` owns it.
    async fn authorize_owner(
        &self,
        owner_id: Uuid,
        media_id: Uuid,
    ) -> Result<MediaRecord, AppError> {
        let record = self
            .repository
            .get_by_id(media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media_id)))?;

        if !record.is_owned_by(owner_id) {
            tracing::warn!(
                owner_id = %owner_id,
                media_id = %media_id,
                "Upload rejected: caller does not own the media record"
            );
            return Err(AppError::Forbidden(
                "You do not have permission to modify this media".to_string(),
            ));
        }

        Ok(record)
    }

    async fn commit_reference(
        &self,
        record: &MediaRecord,
        store: &dyn Storage,
        storage_key: &str,
        reference: &str,
    ) -> Result<MediaRecord, AppError> {
        match self.commit(record).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                self.handle_orphan(store, record.id, storage_key, reference)
                    .await;
                Err(e)
            }
        }
    }

    /// Update the record, retrying with linear backoff. The same reference is written every time.
    async fn commit(&self, record: &MediaRecord) -> Result<MediaRecord, AppError> {
        let attempts = self.settings.metadata_commit_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.repository.update(record).await {
                Ok(updated) => return Ok(updated),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        error = %e,
                        media_id = %record.id,
                        attempt,
                        "Metadata commit failed, retrying"
                    );
                    tokio::time::sleep(self.settings.metadata_commit_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        media_id = %record.id,
                        attempts,
                        "Metadata commit failed"
                    );
                    return Err(AppError::MetadataCommitFailure(format!(
                        "Failed to commit reference for media {} after {} attempt(s): {}",
                        record.id, attempts, e
                    )));
                }
            }
        }
    }

    async fn handle_orphan(
        &self,
        store: &dyn Storage,
        media_id: Uuid,
        storage_key: &str,
        reference: &str,
    ) {
        if self.settings.orphan_policy == OrphanPolicy::Delete {
            match store.delete(storage_key).await {
                Ok(()) => {
                    tracing::info!(
                        media_id = %media_id,
                        storage_key = %storage_key,
                        "Deleted object left unreferenced by failed metadata commit"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        media_id = %media_id,
                        storage_key = %storage_key,
                        "Compensating delete failed"
                    );
                }
            }
        }

        self.reconciliation
            .record(&OrphanedObject::new(media_id, storage_key, reference))
            .await;
    }
}

fn check_declared_length(declared: Option<u64>, limit: u64) -> Result<(), AppError> {
    match declared {
        Some(length) if length > limit => Err(AppError::PayloadTooLarge(format!(
            "Declared length {} exceeds the {} byte limit",
            length, limit
        ))),
        _ => Ok(()),
    }
}

fn reference_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

fn staging_error(err: StagingError, limit: u64) -> AppError {
    match err {
        StagingError::TooLarge { .. } => {
            AppError::PayloadTooLarge(format!("Upload exceeds the {} byte limit", limit))
        }
        StagingError::Io(e) => body_read_error(&e),
        StagingError::Create { dir, source } => AppError::IoFailure(format!(
            "Failed to create staged file in {}: {}",
            dir.display(),
            source
        )),
    }
}

fn asset_write_error(err: StorageError, limit: u64) -> AppError {
    match err {
        StorageError::IoError(e) if size_limit_exceeded(&e) => {
            AppError::PayloadTooLarge(format!("Upload exceeds the {} byte limit", limit))
        }
        StorageError::IoError(e) => body_read_error(&e),
        other => AppError::IoFailure(other.to_string()),
    }
}
