//! Common utilities for file upload handlers

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::{header::CONTENT_LENGTH, HeaderMap, StatusCode};
use futures::TryStreamExt;
use reelhouse_core::AppError;
use std::io;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use uuid::Uuid;

/// Failure reading the multipart body, carried inside the `io::Error` of a field reader.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BodyReadError {
    pub status: StatusCode,
    pub message: String,
}

impl From<MultipartError> for BodyReadError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

/// Map an error raised while reading an upload body to the matching `AppError`.
///
/// Multipart failures become `PayloadTooLarge` or `BadRequest`. Anything else is a local I/O failure.
pub fn body_read_error(err: &io::Error) -> AppError {
    match err.get_ref().and_then(|inner| inner.downcast_ref::<BodyReadError>()) {
        Some(body) if body.status == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(body.message.clone())
        }
        Some(body) => AppError::BadRequest(format!("Malformed upload body: {}", body.message)),
        None => AppError::IoFailure(err.to_string()),
    }
}

pub fn parse_media_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
}

/// The request's `Content-Length`, if present and numeric
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Read the single file part of a multipart body, which must be named `name`.
pub async fn next_file_field<'a>(
    multipart: &'a mut Multipart,
    name: &str,
) -> Result<Field<'a>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e.body_text())))?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    if field.name() != Some(name) {
        return Err(AppError::BadRequest(format!(
            "Expected a single file part named '{}'",
            name
        )));
    }

    Ok(field)
}

/// Stream a multipart field as an `AsyncRead` without buffering it in memory.
pub fn field_reader(field: Field<'_>) -> impl AsyncRead + Send + Unpin + '_ {
    let stream = field.map_err(|e| io::Error::other(BodyReadError::from(e)));
    StreamReader::new(Box::pin(stream))
}

/// Strip parameters and validate the `type/subtype` shape of a content type.
///
/// Returns the lowercased base media type, e.g. `"Video/MP4; codecs=avc1"` gives `"video/mp4"`.
pub fn parse_media_type(content_type: Option<&str>) -> Result<String, AppError> {
    let raw = content_type.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::BadRequest("Missing content type".to_string()));
    }

    let base = raw.split(';').next().unwrap_or_default().trim().to_lowercase();
    let valid = match base.split_once('/') {
        Some((kind, subtype)) => is_token(kind) && is_token(subtype),
        None => false,
    };
    if !valid {
        return Err(AppError::BadRequest(format!(
            "Unparseable content type '{}'",
            raw
        )));
    }

    Ok(base)
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '!' | '#' | '$' | '&' | '-' | '^' | '_' | '.' | '+')
        })
}
