use async_trait::async_trait;
use chrono::Utc;
use reelhouse_core::{AppError, MediaRecord};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Get and full-record update of media records.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    /// Replace every mutable column of the stored record with `record`.
    async fn update(&self, record: &MediaRecord) -> Result<MediaRecord, AppError>;
}

/// Postgres-backed [`MediaRepository`]
#[derive(Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "media_records", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, MediaRecord>(
            r#"
            SELECT id, owner_id, title, description, thumbnail_url, video_url, created_at, updated_at
            FROM media_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "media_records", db.operation = "update", db.record_id = %record.id))]
    async fn update(&self, record: &MediaRecord) -> Result<MediaRecord, AppError> {
        let updated = sqlx::query_as::<Postgres, MediaRecord>(
            r#"
            UPDATE media_records
            SET owner_id = $2,
                title = $3,
                description = $4,
                thumbnail_url = $5,
                video_url = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING id, owner_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.thumbnail_url)
        .bind(&record.video_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| {
            AppError::MetadataCommitFailure(format!(
                "Media record {} no longer exists",
                record.id
            ))
        })
    }
}
