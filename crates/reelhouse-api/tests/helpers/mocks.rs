//! In-memory stand-ins for the repository, object store, prober and transcoder.

use async_trait::async_trait;
use reelhouse_core::{AppError, MediaRecord, StorageBackend};
use reelhouse_db::MediaRepository;
use reelhouse_processing::{
    CommandError, Normalizer, ProbeError, Prober, StreamMetadata, TranscodeError,
};
use reelhouse_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryMediaRepository {
    records: Mutex<HashMap<Uuid, MediaRecord>>,
    /// Number of upcoming `update` calls that fail before one succeeds
    failing_updates: AtomicU32,
    update_calls: AtomicU32,
}

impl InMemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: MediaRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<MediaRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_next_updates(&self, count: u32) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        Ok(self.get(id))
    }

    async fn update(&self, record: &MediaRecord) -> Result<MediaRecord, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Internal("connection reset".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        let stored = records.get_mut(&record.id).ok_or_else(|| {
            AppError::MetadataCommitFailure(format!("Media record {} no longer exists", record.id))
        })?;
        let mut updated = record.clone();
        updated.updated_at = chrono::Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }
}

/// Object store that keeps everything in memory and counts writes and deletes.
#[derive(Default)]
pub struct RecordingStorage {
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    writes: AtomicU32,
    deletes: AtomicU32,
    fail_uploads: bool,
    fail_deletes: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u32 {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    fn store(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> StorageResult<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }
        let len = bytes.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(len)
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let bytes = tokio::fs::read(path).await?;
        self.store(storage_key, content_type, bytes)
    }

    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        self.store(storage_key, content_type, bytes)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed("access denied".to_string()));
        }
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Prober that returns fixed metadata and records what it was asked to probe.
///
/// With no metadata it fails the way ffprobe does on output it cannot decode.
pub struct CannedProber {
    metadata: Option<StreamMetadata>,
    probed: Mutex<Vec<PathBuf>>,
    inputs_present: AtomicU32,
}

impl CannedProber {
    pub fn new(metadata: StreamMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            probed: Mutex::new(Vec::new()),
            inputs_present: AtomicU32::new(0),
        }
    }

    pub fn undecodable() -> Self {
        Self {
            metadata: None,
            probed: Mutex::new(Vec::new()),
            inputs_present: AtomicU32::new(0),
        }
    }

    /// Number of probes whose input file existed on disk when probed.
    pub fn inputs_present(&self) -> u32 {
        self.inputs_present.load(Ordering::SeqCst)
    }

    pub fn found(width: u32, height: u32) -> Self {
        Self::new(StreamMetadata::Found { width, height })
    }

    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for CannedProber {
    async fn probe(&self, path: &Path) -> Result<StreamMetadata, ProbeError> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        if path.exists() {
            self.inputs_present.fetch_add(1, Ordering::SeqCst);
        }
        match self.metadata {
            Some(metadata) => Ok(metadata),
            None => Err(ProbeError::Decode(
                serde_json::from_str::<serde_json::Value>("{\"streams\": [").unwrap_err(),
            )),
        }
    }
}

/// Normalizer that copies its input unchanged.
#[derive(Default)]
pub struct CopyingNormalizer {
    calls: AtomicU32,
}

impl CopyingNormalizer {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Normalizer for CopyingNormalizer {
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(input, output)
            .await
            .map_err(|source| CommandError::Wait {
                program: "copy".to_string(),
                source,
            })?;
        Ok(())
    }
}

/// Normalizer that leaves a partial output behind and then fails.
pub struct FailingNormalizer;

#[async_trait]
impl Normalizer for FailingNormalizer {
    async fn normalize(&self, _input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let _ = tokio::fs::write(output, b"partial moov").await;
        Err(TranscodeError::Command(CommandError::Failed {
            program: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "moov atom not found".to_string(),
        }))
    }
}
