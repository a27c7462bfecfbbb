//! Reelhouse API Library
//!
//! HTTP surface for media ingestion: authentication, upload handlers, the
//! ingestion orchestrator, and application setup.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::ingest::{IngestionService, OrphanedObject, ReconciliationLog};
pub use state::AppState;
