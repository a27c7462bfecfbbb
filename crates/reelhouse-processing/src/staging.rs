//! Staging store for in-flight uploads.
//!
//! Both temporary files an upload produces are owned by drop guards:
//! [`StagedFile`] holds the raw body and [`NormalizedFile`] holds the remuxed
//! output. Dropping the guards removes the files, whichever way the request
//! leaves the pipeline, client disconnects included.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

const STAGED_PREFIX: &str = "reelhouse-upload-";
const NORMALIZED_SUFFIX: &str = ".processing";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staged file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write staged file: {0}")]
    Io(#[from] io::Error),

    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
}

/// Marker carried inside the `io::Error` a [`SizeLimitedReader`] returns.
#[derive(Debug)]
pub struct SizeLimitExceeded {
    pub limit: u64,
}

impl fmt::Display for SizeLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream exceeded the {} byte limit", self.limit)
    }
}

impl std::error::Error for SizeLimitExceeded {}

/// Whether `err` was produced by a [`SizeLimitedReader`] hitting its limit.
pub fn size_limit_exceeded(err: &io::Error) -> bool {
    err.get_ref()
        .map(|inner| inner.is::<SizeLimitExceeded>())
        .unwrap_or(false)
}

/// Reader adapter that fails once more than `limit` bytes have been read.
pub struct SizeLimitedReader<R> {
    inner: R,
    limit: u64,
    consumed: u64,
}

impl<R> SizeLimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            consumed: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for SizeLimitedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        self.consumed += (buf.filled().len() - before) as u64;

        if self.consumed > self.limit {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                SizeLimitExceeded { limit: self.limit },
            )));
        }
        Poll::Ready(Ok(()))
    }
}

/// The raw upload body on local disk, removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Create a uniquely named, empty file in `dir`.
    pub fn create_in(dir: &Path, suffix: &str) -> Result<Self, StagingError> {
        let file = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|source| StagingError::Create {
                dir: dir.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Stream `reader` into the file, failing with [`StagingError::TooLarge`]
    /// as soon as more than `limit` bytes arrive.
    pub async fn write_from<R>(&mut self, reader: R, limit: u64) -> Result<u64, StagingError>
    where
        R: AsyncRead + Unpin,
    {
        let std_file = self.file.as_file().try_clone()?;
        let mut file = tokio::fs::File::from_std(std_file);
        let mut limited = SizeLimitedReader::new(reader, limit);

        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| {
                if size_limit_exceeded(&e) {
                    StagingError::TooLarge { limit }
                } else {
                    StagingError::Io(e)
                }
            })?;

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

/// Output path of the fast-start remux, removed when dropped.
///
/// The guard exists before the remux runs, so a partially written output is
/// cleaned up even when the transcoder fails or is killed.
#[derive(Debug)]
pub struct NormalizedFile {
    path: PathBuf,
}

impl NormalizedFile {
    /// Reserve `<input>.processing` as the normalized output path.
    pub fn for_input(input: &Path) -> Self {
        let mut path = input.as_os_str().to_owned();
        path.push(NORMALIZED_SUFFIX);
        Self {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NormalizedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed normalized file");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to remove normalized file"
                );
            }
        }
    }
}
