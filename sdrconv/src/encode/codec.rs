//! Narrow interface over the external MP3 encoder.
//!
//! The encoder decides how much PCM it accepts per call and buffers internally,
//! so a call may return zero bytes and a later call several frames at once.
//! [`Mp3Codec::finish`] drains whatever the encoder still holds.

use crate::encode::settings::{AudioSampleRate, Mp3Setting};
use crate::utils::errors::CodecError;

/// MPEG Layer III frame length in bytes at the target bitrate.
pub const MP3_FRAME_SIZE: usize = 144;

pub trait Mp3Codec {
    /// Largest PCM input, in bytes of 16-bit little-endian mono, accepted per
    /// [`encode`](Mp3Codec::encode) call.
    fn required_input_size(&self) -> usize;

    /// Output buffer length that always fits one call's output.
    fn required_output_size(&self) -> usize;

    /// Encodes one chunk of 16-bit little-endian PCM into `output`.
    ///
    /// Returns the number of bytes written, possibly zero.
    fn encode(&mut self, pcm: &[u8], output: &mut [u8]) -> Result<usize, CodecError>;

    /// Flushes the encoder's internal buffer into `output`.
    ///
    /// Returns the number of bytes written; zero when nothing is pending.
    fn finish(&mut self, output: &mut [u8]) -> Result<usize, CodecError>;
}

/// Constructs codecs for a sample rate and preset.
///
/// The preset is passed through as-is; interpreting it is the codec's job.
pub trait Mp3CodecBuilder {
    type Codec: Mp3Codec;

    fn build(&self, rate: AudioSampleRate, setting: Mp3Setting)
    -> Result<Self::Codec, CodecError>;
}

impl<F, C> Mp3CodecBuilder for F
where
    F: Fn(AudioSampleRate, Mp3Setting) -> Result<C, CodecError>,
    C: Mp3Codec,
{
    type Codec = C;

    fn build(&self, rate: AudioSampleRate, setting: Mp3Setting) -> Result<C, CodecError> {
        self(rate, setting)
    }
}

impl<C: Mp3Codec + ?Sized> Mp3Codec for Box<C> {
    fn required_input_size(&self) -> usize {
        (**self).required_input_size()
    }

    fn required_output_size(&self) -> usize {
        (**self).required_output_size()
    }

    fn encode(&mut self, pcm: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
        (**self).encode(pcm, output)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<usize, CodecError> {
        (**self).finish(output)
    }
}
