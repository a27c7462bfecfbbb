//! Reelhouse Processing Library
//!
//! Local-disk and subprocess stages of the ingestion pipeline:
//!
//! - [`staging`]: scoped temporary files for in-flight uploads
//! - [`command`]: bounded execution of external binaries
//! - [`video`]: fast-start remux, stream probing and aspect classification

pub mod command;
pub mod staging;
pub mod video;

pub use command::CommandError;
pub use staging::{
    size_limit_exceeded, NormalizedFile, SizeLimitedReader, StagedFile, StagingError,
};
pub use video::{
    classify, FfmpegNormalizer, FfprobeProber, Normalizer, ProbeError, Prober, StreamMetadata,
    TranscodeError,
};
