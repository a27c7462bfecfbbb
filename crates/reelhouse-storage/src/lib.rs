//! Reelhouse Storage Library
//!
//! Storage abstraction for ingested media: the [`Storage`] trait, an S3
//! backend built on `object_store`, and a local filesystem backend that also
//! backs the served assets directory.
//!
//! # Storage key format
//!
//! Video keys are `{classification}/{token}.mp4` and thumbnail asset names are
//! `{token}.jpg` / `{token}.png`, where `token` is 32 random bytes encoded as
//! unpadded URL-safe base64. Key generation lives in the [`keys`] module so
//! both ingestion paths share it. Keys never contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use factory::create_asset_storage;
pub use factory::create_storage;
pub use keys::{derive_filename, derive_key, random_token};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelhouse_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
