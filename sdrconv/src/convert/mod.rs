//! Conversion of raw tuner buffers into sample buffers.
//!
//! - [`dc`]: the running DC bias estimator shared by all converters
//! - [`packed`]: 12-bit packed unpacking, sequential and lane-parallel
//! - [`byte`]: 8-bit unsigned ingestion with deferred DC correction

pub mod byte;
pub mod dc;
pub mod packed;
