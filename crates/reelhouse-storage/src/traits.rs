//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Both backends (S3, local filesystem) implement this trait so the ingestion
/// pipeline never depends on where bytes end up. Reference URLs are composed by
/// the caller from a configured base and the key; backends only move bytes.
///
/// A failed upload must not leave a readable object under `storage_key`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload the file at `path` under `storage_key`, returning the number of bytes stored.
    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Upload everything `reader` yields until EOF under `storage_key`.
    ///
    /// Read errors are returned as [`StorageError::IoError`] with the original
    /// error preserved so callers can inspect it.
    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64>;

    /// Delete a stored object. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
