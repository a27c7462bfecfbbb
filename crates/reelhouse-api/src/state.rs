//! Application state shared by every handler.

use crate::services::ingest::IngestionService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestionService>,
}
