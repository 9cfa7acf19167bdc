use log::{Level, debug};

use crate::encode::codec::{Mp3Codec, Mp3CodecBuilder};
use crate::encode::resample::{Resampler, SincResampler};
use crate::encode::settings::{AudioSampleRate, Mp3Setting, NATIVE_SAMPLE_RATE};
use crate::log_or_err;
use crate::utils::errors::{CodecError, EncodeError};
use crate::utils::pcm::to_signed_16_bit_le;

/// Receives every non-empty compressed chunk as it is produced.
pub type FrameSink = Box<dyn FnMut(&[u8]) + Send>;

/// Feeds PCM blocks through an MP3 codec and collects its output.
///
/// Input blocks are mono floats at 8000 Hz. When the configured
/// [`AudioSampleRate`] differs, blocks are first resampled to it. The codec
/// is fed in chunks no larger than its
/// [`required_input_size`](Mp3Codec::required_input_size), and every chunk that
/// yields output adds one entry to the result. Each [`encode`](Self::encode)
/// call ends with an end-of-block flush of the codec.
///
/// # Example
///
/// ```rust,no_run
/// use sdrconv::encode::codec::Mp3Codec;
/// use sdrconv::encode::encoder::StreamingAudioEncoder;
/// use sdrconv::encode::settings::{AudioSampleRate, Mp3Setting};
///
/// fn run<C: Mp3Codec>(codec: C) -> anyhow::Result<()> {
///     let mut encoder =
///         StreamingAudioEncoder::with_codec(codec, AudioSampleRate::Sr8000, Mp3Setting::Cbr16)?;
///
///     let frames = encoder.encode(&[vec![0.0f32; 8000]])?;
///     let tail = encoder.flush()?;
///
///     let total: usize = frames.iter().chain(&tail).map(Vec::len).sum();
///     println!("{total} bytes of MP3");
///     Ok(())
/// }
/// ```
///
/// # Failure handling
///
/// A codec error on one chunk is logged at `warn` and that chunk's output is
/// dropped; the remaining chunks are still encoded. Setting the fail level to
/// [`Level::Warn`] turns these into returned errors instead.
pub struct StreamingAudioEncoder<C: Mp3Codec> {
    codec: C,
    resampler: Option<Box<dyn Resampler>>,
    output_buffer: Vec<u8>,
    input_size: usize,
    frame_sink: Option<FrameSink>,
    rate: AudioSampleRate,
    setting: Mp3Setting,
    fail_level: Level,
    pcm_bytes_in: usize,
    bytes_out: usize,
    chunk_failures: usize,
}

impl<C: Mp3Codec> std::fmt::Debug for StreamingAudioEncoder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingAudioEncoder")
            .field("rate", &self.rate)
            .field("setting", &self.setting)
            .field("input_size", &self.input_size)
            .field("resampling", &self.resampler.is_some())
            .field("pcm_bytes_in", &self.pcm_bytes_in)
            .field("bytes_out", &self.bytes_out)
            .finish()
    }
}

impl<C: Mp3Codec> StreamingAudioEncoder<C> {
    /// Builds the codec for `rate` and `setting`, attaching a
    /// [`SincResampler`] when `rate` is not the native 8000 Hz.
    pub fn new<B>(
        rate: AudioSampleRate,
        setting: Mp3Setting,
        builder: &B,
    ) -> Result<Self, EncodeError>
    where
        B: Mp3CodecBuilder<Codec = C>,
    {
        let codec = builder.build(rate, setting).map_err(EncodeError::Build)?;
        let encoder = Self::with_codec(codec, rate, setting)?;

        if rate.is_native() {
            return Ok(encoder);
        }

        let resampler = SincResampler::new(NATIVE_SAMPLE_RATE, rate.sample_rate())?;
        Ok(encoder.with_resampler(Box::new(resampler)))
    }

    /// Wraps an already configured codec. No resampler is attached.
    pub fn with_codec(
        codec: C,
        rate: AudioSampleRate,
        setting: Mp3Setting,
    ) -> Result<Self, EncodeError> {
        let input_size = codec.required_input_size();
        if input_size < 2 {
            return Err(EncodeError::Build(CodecError::InvalidConfiguration(format!(
                "required input size {input_size} is smaller than one sample"
            ))));
        }
        // Chunks must hold whole 16-bit samples.
        let input_size = input_size & !1;

        Ok(Self {
            output_buffer: vec![0u8; codec.required_output_size()],
            codec,
            resampler: None,
            input_size,
            frame_sink: None,
            rate,
            setting,
            fail_level: Level::Error,
            pcm_bytes_in: 0,
            bytes_out: 0,
            chunk_failures: 0,
        })
    }

    pub fn with_resampler(mut self, resampler: Box<dyn Resampler>) -> Self {
        self.resampler = Some(resampler);
        self
    }

    /// Sets the failure level for codec and resampler errors.
    ///
    /// - `log::Level::Error`: log and continue (default)
    /// - `log::Level::Warn`: return the error (strict mode)
    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    /// Installs a hook that sees every compressed chunk, e.g. for inspection.
    pub fn set_frame_sink(&mut self, sink: FrameSink) {
        self.frame_sink = Some(sink);
    }

    pub fn rate(&self) -> AudioSampleRate {
        self.rate
    }

    pub fn setting(&self) -> Mp3Setting {
        self.setting
    }

    pub fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// PCM bytes handed to the codec so far.
    pub fn pcm_bytes_in(&self) -> usize {
        self.pcm_bytes_in
    }

    /// Compressed bytes returned to callers so far.
    pub fn bytes_out(&self) -> usize {
        self.bytes_out
    }

    /// Chunks whose output was dropped after a codec error.
    pub fn chunk_failures(&self) -> usize {
        self.chunk_failures
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Encodes `blocks` and returns the compressed chunks in order.
    ///
    /// Empty chunks are never returned, so an empty input yields an empty
    /// result unless the codec still held data from earlier calls.
    pub fn encode(&mut self, blocks: &[Vec<f32>]) -> Result<Vec<Vec<u8>>, EncodeError> {
        let resampled = match self.resampler.as_mut().map(|r| r.resample(blocks)) {
            Some(Ok(resampled)) => {
                debug!(
                    "Resampled {} block(s) into {} block(s)",
                    blocks.len(),
                    resampled.len()
                );
                Some(resampled)
            }
            Some(Err(e)) => {
                log_or_err!(self, Level::Warn, EncodeError::Resample(e));
                None
            }
            None => None,
        };
        let blocks = resampled.as_deref().unwrap_or(blocks);

        let mut converted = Vec::new();
        for block in blocks {
            let pcm = to_signed_16_bit_le(block);
            self.encode_pcm(&pcm, &mut converted)?;
        }

        self.finish_into(&mut converted)?;
        Ok(converted)
    }

    /// Drains the resampler and the codec at end of stream.
    ///
    /// Returns a single chunk with whatever was still buffered, or nothing.
    /// Calling it again with nothing pending returns an empty vector.
    pub fn flush(&mut self) -> Result<Vec<Vec<u8>>, EncodeError> {
        let mut tail = Vec::new();

        let drained = self.resampler.as_mut().map(|r| r.flush());
        match drained {
            Some(Ok(samples)) if !samples.is_empty() => {
                let pcm = to_signed_16_bit_le(&samples);
                self.encode_pcm(&pcm, &mut tail)?;
            }
            Some(Err(e)) => log_or_err!(self, Level::Warn, EncodeError::Resample(e)),
            _ => {}
        }

        self.finish_into(&mut tail)?;

        let frame = tail.concat();
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![frame])
    }

    fn encode_pcm(
        &mut self,
        pcm: &[u8],
        converted: &mut Vec<Vec<u8>>,
    ) -> Result<(), EncodeError> {
        let mut offset = 0;

        while offset < pcm.len() {
            let chunk_len = self.input_size.min(pcm.len() - offset);
            let chunk = &pcm[offset..offset + chunk_len];

            let written = self
                .codec
                .encode(chunk, &mut self.output_buffer)
                .and_then(|len| self.check_output_len(len));
            match written {
                Ok(0) => {}
                Ok(len) => self.emit(len, converted),
                Err(source) => {
                    self.chunk_failures += 1;
                    log_or_err!(self, Level::Warn, EncodeError::ChunkFailed { offset, source });
                }
            }

            self.pcm_bytes_in += chunk_len;
            offset += chunk_len;
        }

        Ok(())
    }

    fn finish_into(&mut self, converted: &mut Vec<Vec<u8>>) -> Result<(), EncodeError> {
        let written = self
            .codec
            .finish(&mut self.output_buffer)
            .and_then(|len| self.check_output_len(len));
        match written {
            Ok(0) => {}
            Ok(len) => self.emit(len, converted),
            Err(e) => log_or_err!(self, Level::Warn, EncodeError::FinishFailed(e)),
        }
        Ok(())
    }

    /// A codec claiming more bytes than the buffer holds has lost output.
    fn check_output_len(&self, len: usize) -> Result<usize, CodecError> {
        let available = self.output_buffer.len();
        if len > available {
            return Err(CodecError::OutputTooSmall {
                needed: len,
                available,
            });
        }
        Ok(len)
    }

    fn emit(&mut self, len: usize, converted: &mut Vec<Vec<u8>>) {
        let chunk = self.output_buffer[..len].to_vec();

        if let Some(sink) = self.frame_sink.as_mut() {
            sink(&chunk);
        }

        self.bytes_out += len;
        converted.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::codec::MP3_FRAME_SIZE;
    use crate::encode::codec::testing::{BufferingCodec, PCM_BYTES_PER_FRAME, buffering_builder};
    use std::sync::{Arc, Mutex};

    fn native_encoder(codec: BufferingCodec) -> StreamingAudioEncoder<BufferingCodec> {
        StreamingAudioEncoder::with_codec(codec, AudioSampleRate::Sr8000, Mp3Setting::Cbr16)
            .unwrap()
    }

    #[test]
    fn chunks_to_codec_input_size() -> anyhow::Result<()> {
        let mut encoder = native_encoder(BufferingCodec::new(PCM_BYTES_PER_FRAME));

        // 3000 samples = 6000 bytes => 5 full chunks + one 240 byte chunk
        let frames = encoder.encode(&[vec![0.25; 3000]])?;

        assert_eq!(encoder.codec().calls, 6);
        assert_eq!(encoder.codec().max_chunk_seen, PCM_BYTES_PER_FRAME);
        assert_eq!(encoder.pcm_bytes_in(), 6000);

        // 5 frames while feeding, then a short tail from the end-of-block flush
        assert_eq!(frames.len(), 6);
        assert!(frames[..5].iter().all(|f| f.len() == MP3_FRAME_SIZE));
        assert_eq!(frames[5].len(), 240 / 8);
        Ok(())
    }

    #[test]
    fn skips_empty_codec_output() -> anyhow::Result<()> {
        // Small input chunks: the codec needs several calls per frame.
        let mut encoder = native_encoder(BufferingCodec::new(256));

        let frames = encoder.encode(&[vec![0.0; 576], vec![0.0; 576]])?;
        assert!(frames.iter().all(|f| !f.is_empty()));
        assert_eq!(
            frames.iter().map(Vec::len).sum::<usize>(),
            2 * MP3_FRAME_SIZE
        );
        Ok(())
    }

    #[test]
    fn empty_input_is_noop() -> anyhow::Result<()> {
        let mut encoder = native_encoder(BufferingCodec::new(PCM_BYTES_PER_FRAME));
        assert!(encoder.encode(&[])?.is_empty());
        assert!(encoder.encode(&[Vec::new()])?.is_empty());
        assert_eq!(encoder.codec().calls, 0);
        Ok(())
    }

    #[test]
    fn chunk_failure_is_best_effort() -> anyhow::Result<()> {
        let mut encoder = native_encoder(BufferingCodec::failing_on(PCM_BYTES_PER_FRAME, 2));

        let frames = encoder.encode(&[vec![0.5; 576 * 4]])?;

        // the second chunk was dropped; the other three still produced frames
        assert_eq!(encoder.chunk_failures(), 1);
        assert_eq!(encoder.codec().calls, 4);
        assert_eq!(frames.len(), 3);
        Ok(())
    }

    #[test]
    fn strict_mode_propagates_failure() {
        let mut encoder = native_encoder(BufferingCodec::failing_on(PCM_BYTES_PER_FRAME, 1));
        encoder.set_fail_level(Level::Warn);

        let result = encoder.encode(&[vec![0.5; 576]]);
        assert!(matches!(
            result,
            Err(EncodeError::ChunkFailed { offset: 0, .. })
        ));
    }

    #[test]
    fn flush_is_idempotent() -> anyhow::Result<()> {
        let mut encoder = native_encoder(BufferingCodec::new(PCM_BYTES_PER_FRAME));
        assert!(encoder.flush()?.is_empty());
        assert!(encoder.flush()?.is_empty());

        encoder.encode(&[vec![0.1; 100]])?;
        assert!(encoder.flush()?.is_empty());
        Ok(())
    }

    #[test]
    fn finish_failure_is_logged() -> anyhow::Result<()> {
        let mut codec = BufferingCodec::new(PCM_BYTES_PER_FRAME);
        codec.fail_finish = true;
        let mut encoder = native_encoder(codec);

        let frames = encoder.encode(&[vec![0.1; 600]])?;
        assert_eq!(frames.len(), 1);
        assert!(encoder.flush()?.is_empty());
        Ok(())
    }

    #[test]
    fn frame_sink_sees_every_chunk() -> anyhow::Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);

        let mut encoder = native_encoder(BufferingCodec::new(PCM_BYTES_PER_FRAME));
        encoder.set_frame_sink(Box::new(move |chunk: &[u8]| {
            sink_seen.lock().unwrap().push(chunk.len());
        }));

        let frames = encoder.encode(&[vec![0.0; 2000]])?;
        let lengths: Vec<usize> = frames.iter().map(Vec::len).collect();
        assert_eq!(*seen.lock().unwrap(), lengths);
        assert_eq!(encoder.bytes_out(), lengths.iter().sum::<usize>());
        Ok(())
    }

    #[test]
    fn native_rate_has_no_resampler() -> anyhow::Result<()> {
        let encoder = StreamingAudioEncoder::new(
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
            &buffering_builder,
        )?;
        assert!(!encoder.is_resampling());

        let encoder = StreamingAudioEncoder::new(
            AudioSampleRate::Sr22050,
            Mp3Setting::Vbr7,
            &buffering_builder,
        )?;
        assert!(encoder.is_resampling());
        assert_eq!(encoder.setting(), Mp3Setting::Vbr7);
        Ok(())
    }

    #[test]
    fn resampled_stream_is_flushed() -> anyhow::Result<()> {
        let mut encoder = StreamingAudioEncoder::new(
            AudioSampleRate::Sr44100,
            Mp3Setting::Cbr32,
            &buffering_builder,
        )?;

        // less than one resampler chunk: nothing reaches the codec yet
        assert!(encoder.encode(&[vec![0.2; 500]])?.is_empty());
        assert_eq!(encoder.pcm_bytes_in(), 0);

        let tail = encoder.flush()?;
        assert_eq!(tail.len(), 1);
        assert!(encoder.pcm_bytes_in() > 0);
        Ok(())
    }

    /// Reports one frame per call but only has room for part of it.
    struct OverReportingCodec;

    impl Mp3Codec for OverReportingCodec {
        fn required_input_size(&self) -> usize {
            PCM_BYTES_PER_FRAME
        }

        fn required_output_size(&self) -> usize {
            100
        }

        fn encode(&mut self, _pcm: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
            output.fill(0xFF);
            Ok(MP3_FRAME_SIZE)
        }

        fn finish(&mut self, _output: &mut [u8]) -> Result<usize, CodecError> {
            Ok(0)
        }
    }

    #[test]
    fn oversized_output_counts_as_failure() -> anyhow::Result<()> {
        let mut encoder = StreamingAudioEncoder::with_codec(
            OverReportingCodec,
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
        )?;

        let frames = encoder.encode(&[vec![0.0; 576]])?;
        assert!(frames.is_empty());
        assert_eq!(encoder.chunk_failures(), 1);
        assert_eq!(encoder.bytes_out(), 0);

        encoder.set_fail_level(Level::Warn);
        let result = encoder.encode(&[vec![0.0; 576]]);
        assert!(matches!(
            result,
            Err(EncodeError::ChunkFailed {
                source: CodecError::OutputTooSmall {
                    needed: 144,
                    available: 100
                },
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn rejects_zero_input_size() {
        let result = StreamingAudioEncoder::with_codec(
            BufferingCodec::new(0),
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
        );
        assert!(matches!(result, Err(EncodeError::Build(_))));
    }
}
