//! Database repositories for data access layer

pub mod media;

pub use media::{MediaRepository, PgMediaRepository};
