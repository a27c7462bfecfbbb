//! Storage setup

use anyhow::{Context, Result};
use reelhouse_core::Config;
use reelhouse_storage::Storage;
use std::sync::Arc;

/// Create the video object store and the local assets store.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Arc<dyn Storage>)> {
    let storage = reelhouse_storage::create_storage(config)
        .await
        .context("Failed to initialize video storage")?;

    let assets = reelhouse_storage::create_asset_storage(config)
        .await
        .context("Failed to initialize assets directory")?;

    tracing::info!(
        backend = %storage.backend_type(),
        assets_root = %config.assets_root().display(),
        "Storage initialized"
    );

    Ok((storage, assets))
}
