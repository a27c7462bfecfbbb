//! Stream metadata extraction via ffprobe.

use crate::command::{run_with_timeout, validate_executable, CommandError};
use crate::video::aspect::classify;
use async_trait::async_trait;
use reelhouse_core::AspectClassification;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Result of probing a file for its first video stream.
///
/// `NotFound` means the file was analyzed but had no stream with usable
/// geometry. It is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMetadata {
    Found { width: u32, height: u32 },
    NotFound,
}

impl StreamMetadata {
    pub fn classification(&self) -> AspectClassification {
        match *self {
            StreamMetadata::Found { width, height } => classify(width, height),
            StreamMetadata::NotFound => AspectClassification::Other,
        }
    }

    /// Width and height, both zero when no stream was found
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            StreamMetadata::Found { width, height } => (width, height),
            StreamMetadata::NotFound => (0, 0),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to decode ffprobe output: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamMetadata, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    codec_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

/// Decode ffprobe's JSON report into [`StreamMetadata`].
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamMetadata, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)?;

    let Some(stream) = output.streams.first() else {
        return Ok(StreamMetadata::NotFound);
    };

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(StreamMetadata::Found { width, height }),
        _ => {
            tracing::debug!(
                codec_type = ?stream.codec_type,
                "First stream carries no dimensions"
            );
            Ok(StreamMetadata::NotFound)
        }
    }
}

/// Production [`Prober`] shelling out to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let ffprobe_path = ffprobe_path.into();
        validate_executable(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    #[tracing::instrument(
        skip_all,
        fields(process.executable.name = "ffprobe", path = %path.display())
    )]
    async fn probe(&self, path: &Path) -> Result<StreamMetadata, ProbeError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path);

        let output = run_with_timeout(command, "ffprobe", self.timeout).await?;
        let metadata = parse_probe_output(&output.stdout)?;

        let (width, height) = metadata.dimensions();
        tracing::debug!(width, height, "Probed video stream");

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_json(width: u32, height: u32) -> String {
        format!(
            r#"{{"streams":[{{"index":0,"codec_name":"h264","codec_type":"video","width":{},"height":{}}}]}}"#,
            width, height
        )
    }

    #[test]
    fn test_parse_landscape_stream() {
        let metadata = parse_probe_output(stream_json(1920, 1080).as_bytes()).unwrap();
        assert_eq!(
            metadata,
            StreamMetadata::Found {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(metadata.classification(), AspectClassification::Landscape);
    }

    #[test]
    fn test_parse_portrait_and_other_streams() {
        let portrait = parse_probe_output(stream_json(1080, 1920).as_bytes()).unwrap();
        assert_eq!(portrait.classification(), AspectClassification::Portrait);

        let other = parse_probe_output(stream_json(1000, 999).as_bytes()).unwrap();
        assert_eq!(other.classification(), AspectClassification::Other);
    }

    #[test]
    fn test_empty_stream_list_is_not_found() {
        for body in [r#"{}"#, r#"{"streams":[]}"#] {
            let metadata = parse_probe_output(body.as_bytes()).unwrap();
            assert_eq!(metadata, StreamMetadata::NotFound);
            assert_eq!(metadata.dimensions(), (0, 0));
            assert_eq!(metadata.classification(), AspectClassification::Other);
        }
    }

    #[test]
    fn test_stream_without_dimensions_is_not_found() {
        let body = r#"{"streams":[{"codec_type":"audio","codec_name":"aac"}]}"#;
        assert_eq!(
            parse_probe_output(body.as_bytes()).unwrap(),
            StreamMetadata::NotFound
        );
    }

    #[test]
    fn test_undecodable_output_is_error() {
        let err = parse_probe_output(b"Invalid data found when processing input").unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[test]
    fn test_rejects_unsafe_executable() {
        let err = FfprobeProber::new("ffprobe && curl evil", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Command(CommandError::InvalidExecutable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let prober =
            FfprobeProber::new("reelhouse-no-such-ffprobe", Duration::from_secs(5)).unwrap();
        let err = prober.probe(Path::new("/tmp/none.mp4")).await.unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Command(CommandError::Launch { .. })
        ));
    }
}
