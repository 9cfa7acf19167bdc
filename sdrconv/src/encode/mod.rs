//! PCM to MP3 encoding with frame-aligned output.
//!
//! 1. **Presets** ([`settings`]): sample rates and bitrate modes
//! 2. **Codec interface** ([`codec`]): the narrow trait over the external encoder
//! 3. **Resampling** ([`resample`]): rate conversion ahead of the codec
//! 4. **Encoding** ([`encoder`]): chunked feeding and end-of-block flushing
//! 5. **Alignment** ([`aligner`]): whole-frame release with carried remainders
//! 6. **Silence** ([`silence`]): aligned silence of a given duration

pub mod aligner;
pub mod codec;
pub mod encoder;
pub mod resample;
pub mod settings;
pub mod silence;
