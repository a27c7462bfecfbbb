//! Test helpers: build the ingestion service and router against in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p reelhouse-api`. No database or
//! ffmpeg install is needed; the repository, object store, prober and
//! transcoder are replaced by the mocks in [`mocks`]. Thumbnails go to a real
//! assets directory under a temp dir.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;
pub mod mocks;

use axum_test::TestServer;
use mocks::{CannedProber, CopyingNormalizer, InMemoryMediaRepository, RecordingStorage};
use reelhouse_api::constants;
use reelhouse_api::services::ingest::{IngestionService, ReconciliationLog};
use reelhouse_api::setup::routes;
use reelhouse_api::state::AppState;
use reelhouse_core::{
    BaseConfig, Config, IngestSettings, OrphanPolicy, ServiceConfig, StorageBackend,
};
use reelhouse_processing::Normalizer;
use reelhouse_storage::LocalStorage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const DISTRIBUTION_BASE_URL: &str = "https://cdn.example.com";
pub const ASSETS_BASE_URL: &str = "http://localhost:8091/assets";

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Knobs for a test context. Defaults describe a healthy pipeline.
pub struct TestOptions {
    pub storage: RecordingStorage,
    pub prober: CannedProber,
    pub normalizer: Arc<dyn Normalizer>,
    pub orphan_policy: OrphanPolicy,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub metadata_commit_retries: u32,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            storage: RecordingStorage::new(),
            prober: CannedProber::found(1920, 1080),
            normalizer: Arc::new(CopyingNormalizer::default()),
            orphan_policy: OrphanPolicy::Reconcile,
            max_video_size_bytes: 1024 * 1024,
            max_thumbnail_size_bytes: 64 * 1024,
            metadata_commit_retries: 2,
        }
    }
}

/// Ingestion service plus the collaborators and directories behind it.
pub struct TestContext {
    pub service: Arc<IngestionService>,
    pub repository: Arc<InMemoryMediaRepository>,
    pub storage: Arc<RecordingStorage>,
    pub prober: Arc<CannedProber>,
    pub config: Config,
    pub staging: TempDir,
    pub assets: TempDir,
    pub work: TempDir,
}

impl TestContext {
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    pub fn assets_dir(&self) -> &Path {
        self.assets.path()
    }

    pub fn reconciliation_log(&self) -> PathBuf {
        self.work.path().join("orphans.jsonl")
    }

    /// HTTP server over the real router, sharing this context's collaborators.
    pub fn server(&self) -> TestServer {
        let state = Arc::new(AppState {
            ingest: self.service.clone(),
        });
        let app = routes::setup_routes(&self.config, state).expect("Failed to build routes");
        TestServer::new(app.into_make_service()).expect("Failed to create test server")
    }
}

pub async fn setup_test_context() -> TestContext {
    setup_test_context_with(TestOptions::default()).await
}

pub async fn setup_test_context_with(options: TestOptions) -> TestContext {
    let staging = tempfile::tempdir().expect("Failed to create staging dir");
    let assets = tempfile::tempdir().expect("Failed to create assets dir");
    let work = tempfile::tempdir().expect("Failed to create work dir");

    let settings = IngestSettings {
        max_video_size_bytes: options.max_video_size_bytes,
        max_thumbnail_size_bytes: options.max_thumbnail_size_bytes,
        staging_dir: staging.path().to_path_buf(),
        distribution_base_url: DISTRIBUTION_BASE_URL.to_string(),
        assets_base_url: ASSETS_BASE_URL.to_string(),
        probe_timeout: Duration::from_secs(5),
        transcode_timeout: Duration::from_secs(5),
        metadata_commit_retries: options.metadata_commit_retries,
        metadata_commit_backoff: Duration::from_millis(1),
        orphan_policy: options.orphan_policy,
        reconciliation_log_path: Some(work.path().join("orphans.jsonl")),
    };

    let config = test_config(settings.clone(), assets.path());

    let repository = Arc::new(InMemoryMediaRepository::new());
    let storage = Arc::new(options.storage);
    let prober = Arc::new(options.prober);
    let asset_storage = LocalStorage::new(assets.path())
        .await
        .expect("Failed to open assets dir");

    let service = IngestionService::new(
        repository.clone(),
        storage.clone(),
        Arc::new(asset_storage),
        prober.clone(),
        options.normalizer,
        settings.clone(),
        ReconciliationLog::new(settings.reconciliation_log_path.clone()),
    );

    TestContext {
        service: Arc::new(service),
        repository,
        storage,
        prober,
        config,
        staging,
        assets,
        work,
    }
}

fn test_config(ingest: IngestSettings, assets_root: &Path) -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_port: 8091,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 5,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            jwt_issuer: auth::TEST_JWT_ISSUER.to_string(),
            environment: "test".to_string(),
            log_format: "pretty".to_string(),
        },
        database_url: "postgres://localhost/reelhouse_test".to_string(),
        run_migrations: false,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(assets_root.to_string_lossy().into_owned()),
        local_storage_base_url: Some(DISTRIBUTION_BASE_URL.to_string()),
        assets_root: assets_root.to_path_buf(),
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        ingest,
    }))
}
