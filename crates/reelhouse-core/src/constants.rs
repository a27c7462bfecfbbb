//! Media type policy shared by the ingestion paths.

/// The only content type accepted for video uploads.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Extension appended to every stored video key.
pub const VIDEO_EXTENSION: &str = ".mp4";

/// Accepted thumbnail content types and the asset extension each one maps to.
pub const THUMBNAIL_TYPES: &[(&str, &str)] = &[("image/jpeg", ".jpg"), ("image/png", ".png")];

/// Multipart part carrying the video file.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart part carrying the thumbnail file.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Returns the asset extension for an accepted thumbnail type.
pub fn thumbnail_extension(media_type: &str) -> Option<&'static str> {
    THUMBNAIL_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == media_type)
        .map(|(_, ext)| *ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_extension() {
        assert_eq!(thumbnail_extension("image/png"), Some(".png"));
        assert_eq!(thumbnail_extension("image/jpeg"), Some(".jpg"));
        assert_eq!(thumbnail_extension("image/gif"), None);
    }
}
