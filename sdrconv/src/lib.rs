#![cfg_attr(feature = "simd", feature(portable_simd))]
//! Sample conversion and MP3 output for software-defined-radio pipelines.
//!
//! ## Technical Overview
//!
//! Two stream boundaries of a receiver chain, both stateful across buffers:
//!
//! ### Ingestion
//!
//! - 12-bit packed tuner samples (2 samples per 3 bytes), unpacked to 16-bit
//! - 8-bit unsigned tuner samples, copied into immutable buffers
//!
//! Every converter keeps a running DC bias estimate (gain 0.007 per buffer)
//! which consumers subtract when reading samples.
//!
//! ### Output
//!
//! Mono PCM at 8000 Hz is optionally resampled, packed to 16-bit and fed to an
//! MP3 codec in codec-sized chunks. The codec's variable output is then cut
//! into whole 144-byte frames, carrying any remainder to the next call.
//!
//! ## Quick Start
//!
//! ```rust
//! use sdrconv::convert::packed::ConverterKind;
//! use sdrconv::encode::aligner::FrameAligner;
//!
//! // Unpack raw tuner bytes
//! let mut converter = ConverterKind::preferred().build();
//! let samples = converter.convert(&[0xAB, 0xCD, 0xEF]);
//! assert_eq!(samples, vec![0xABC, 0xDEF]);
//!
//! // Align encoder output to whole frames
//! let mut aligner = FrameAligner::default();
//! assert!(aligner.push(&[0u8; 100]).is_none());
//! assert_eq!(aligner.push(&[0u8; 200]).map(|f| f.len()), Some(288));
//! ```

/// Conversion of raw tuner buffers.
///
/// - **DC tracking** ([`convert::dc`]): running bias estimate
/// - **Packed samples** ([`convert::packed`]): sequential and lane-parallel unpacking
/// - **8-bit buffers** ([`convert::byte`]): copying ingestion with deferred correction
pub mod convert;

/// PCM to MP3 encoding.
///
/// - **Encoder** ([`encode::encoder`]): chunked codec feeding and flushing
/// - **Alignment** ([`encode::aligner`]): whole-frame release
/// - **Codec interface** ([`encode::codec`]): the external encoder seam
pub mod encode;

/// Utility functions and supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **PCM packing** ([`utils::pcm`]): float to 16-bit conversion
pub mod utils;
