//! Fast-start remux via ffmpeg.
//!
//! Streams are copied without re-encoding and the `moov` atom is moved to the
//! front of the container, so playback can begin before the download ends.

use crate::command::{run_with_timeout, validate_executable, CommandError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("output and input must be different files: {0}")]
    SamePath(String),
}

#[async_trait]
pub trait Normalizer: Send + Sync {
    /// Write a fast-start copy of `input` to `output`.
    ///
    /// `output` may be partially written on failure. Removing it is up to the caller.
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// Production [`Normalizer`] shelling out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, TranscodeError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_executable(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }

    fn build_command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output);
        command
    }
}

#[async_trait]
impl Normalizer for FfmpegNormalizer {
    #[tracing::instrument(
        skip_all,
        fields(
            process.executable.name = "ffmpeg",
            input = %input.display(),
            output = %output.display()
        )
    )]
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        if input == output {
            return Err(TranscodeError::SamePath(input.display().to_string()));
        }

        let start = std::time::Instant::now();
        let command = self.build_command(input, output);
        run_with_timeout(command, "ffmpeg", self.timeout).await?;

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fast-start remux complete"
        );
        Ok(())
    }
}
