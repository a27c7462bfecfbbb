//! Video processing module

pub mod aspect;
pub mod faststart;
pub mod probe;

pub use aspect::classify;
pub use faststart::{FfmpegNormalizer, Normalizer, TranscodeError};
pub use probe::{parse_probe_output, FfprobeProber, ProbeError, Prober, StreamMetadata};
