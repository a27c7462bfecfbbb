//! Record of stored objects that no media record references.
//!
//! An object becomes orphaned when its upload succeeded but the metadata
//! commit did not. Entries are emitted as `warn` events on the
//! `reelhouse::reconciliation` target and, when a path is configured,
//! appended as JSON lines for an out-of-band sweep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanedObject {
    pub media_id: Uuid,
    pub storage_key: String,
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
}

impl OrphanedObject {
    pub fn new(
        media_id: Uuid,
        storage_key: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            media_id,
            storage_key: storage_key.into(),
            reference: reference.into(),
            recorded_at: Utc::now(),
        }
    }
}

pub struct ReconciliationLog {
    path: Option<PathBuf>,
    // Serializes appends so concurrent requests never interleave lines
    write_lock: Mutex<()>,
}

impl ReconciliationLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Record an orphan. Failing to persist the entry is logged, never returned.
    pub async fn record(&self, orphan: &OrphanedObject) {
        tracing::warn!(
            target: "reelhouse::reconciliation",
            media_id = %orphan.media_id,
            storage_key = %orphan.storage_key,
            reference = %orphan.reference,
            "Stored object is not referenced by any media record"
        );

        let Some(path) = &self.path else {
            return;
        };

        let mut line = match serde_json::to_string(orphan) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize orphaned object");
                return;
            }
        };
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                path = %path.display(),
                storage_key = %orphan.storage_key,
                "Failed to append to reconciliation log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orphans.jsonl");
        let log = ReconciliationLog::new(Some(path.clone()));

        let first = OrphanedObject::new(
            Uuid::new_v4(),
            "landscape/a.mp4",
            "https://cdn.example.com/landscape/a.mp4",
        );
        let second = OrphanedObject::new(
            Uuid::new_v4(),
            "other/b.mp4",
            "https://cdn.example.com/other/b.mp4",
        );
        log.record(&first).await;
        log.record(&second).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<OrphanedObject> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries, vec![first, second]);
    }

    #[tokio::test]
    async fn test_without_path_only_logs() {
        let log = ReconciliationLog::new(None);
        log.record(&OrphanedObject::new(Uuid::new_v4(), "k", "r")).await;
    }

    #[tokio::test]
    async fn test_unwritable_path_does_not_fail() {
        let dir = tempdir().unwrap();
        let log = ReconciliationLog::new(Some(dir.path().join("missing/dir/orphans.jsonl")));
        log.record(&OrphanedObject::new(Uuid::new_v4(), "k", "r")).await;
    }
}
