//! Reelhouse Database Library
//!
//! Repository layer over the `media_records` table.

pub mod db;

pub use db::{MediaRepository, PgMediaRepository};
