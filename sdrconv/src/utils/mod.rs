//! Utility functions and supporting infrastructure.
//!
//! Provides PCM sample packing and the error types shared by the
//! converters and the encoder.

pub mod errors;
pub mod pcm;
