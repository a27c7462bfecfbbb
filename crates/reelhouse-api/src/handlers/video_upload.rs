use crate::auth::models::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{declared_content_length, field_reader, next_file_field, parse_media_id};
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use reelhouse_core::constants::VIDEO_FORM_FIELD;
use reelhouse_core::MediaRecord;
use std::sync::Arc;

#[utoipa::path(
    put,
    path = "/api/v1/videos/{media_id}/video",
    tag = "videos",
    params(
        ("media_id" = String, Path, description = "Media record ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Single file part named 'video' with content type video/mp4"),
    responses(
        (status = 200, description = "Video ingested and attached", body = MediaRecord),
        (status = 400, description = "Invalid ID, missing part or content type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the media record", body = ErrorResponse),
        (status = 404, description = "Media record not found", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size ceiling", body = ErrorResponse),
        (status = 415, description = "Content type is not video/mp4", body = ErrorResponse),
        (status = 422, description = "Remux or probe failed", body = ErrorResponse),
        (status = 502, description = "Object store upload failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Path(media_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<MediaRecord>, HttpAppError> {
    let media_id = parse_media_id(&media_id)?;
    let declared_length = declared_content_length(&headers);

    let field = next_file_field(&mut multipart, VIDEO_FORM_FIELD).await?;
    let content_type = field.content_type().map(str::to_string);

    let record = state
        .ingest
        .ingest_video(
            owner.owner_id,
            media_id,
            content_type.as_deref(),
            field_reader(field),
            declared_length,
        )
        .await?;

    Ok(Json(record))
}
