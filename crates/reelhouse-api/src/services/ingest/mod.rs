//! Media ingestion
//!
//! [`IngestionService`] drives both upload paths. The video path runs
//! validate → stage → fast-start remux → probe → classify → derive key →
//! upload → commit; the thumbnail path skips the subprocess stages and writes
//! into the locally served assets directory. Each step fails fast, and every
//! temporary file is owned by a drop guard scoped to the call.

pub mod reconciliation;
pub mod service;

pub use reconciliation::{OrphanedObject, ReconciliationLog};
pub use service::IngestionService;
