//! Data models for the application

mod aspect;
mod media;

pub use aspect::AspectClassification;
pub use media::MediaRecord;
