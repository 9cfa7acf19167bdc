use crate::encode::aligner::{Finished, FrameAlignedAccumulator};
use crate::encode::codec::Mp3CodecBuilder;
use crate::encode::encoder::StreamingAudioEncoder;
use crate::encode::settings::{AudioSampleRate, Mp3Setting, NATIVE_SAMPLE_RATE};
use crate::utils::errors::EncodeError;

/// Produces frame-aligned compressed silence.
///
/// Silence is generated at the native input rate and goes through the same
/// encoder path as real audio, so it picks up the configured resampling and
/// codec preset. Output too short to complete a frame is carried into the
/// next call.
pub struct SilenceGenerator<B: Mp3CodecBuilder> {
    accumulator: FrameAlignedAccumulator<B::Codec>,
}

impl<B: Mp3CodecBuilder> SilenceGenerator<B> {
    pub fn new(
        rate: AudioSampleRate,
        setting: Mp3Setting,
        builder: &B,
    ) -> Result<Self, EncodeError> {
        let encoder = StreamingAudioEncoder::new(rate, setting, builder)?;
        Ok(Self {
            accumulator: FrameAlignedAccumulator::new(encoder),
        })
    }

    /// Encodes `duration_ms` of silence and returns the whole frames produced.
    pub fn generate(&mut self, duration_ms: u64) -> Result<Option<Vec<u8>>, EncodeError> {
        let length = (duration_ms as f64 / 1000.0 * NATIVE_SAMPLE_RATE as f64) as usize;
        if length == 0 {
            return Ok(None);
        }

        self.accumulator.convert(&[vec![0.0f32; length]])
    }

    /// Flushes the encoder and returns the final frames and remainder.
    pub fn finish(self) -> Result<Finished, EncodeError> {
        self.accumulator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::codec::MP3_FRAME_SIZE;
    use crate::encode::codec::testing::buffering_builder;

    #[test]
    fn short_durations_are_carried() -> anyhow::Result<()> {
        let mut generator = SilenceGenerator::new(
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
            &buffering_builder,
        )?;

        // 10 ms = 80 samples = 160 PCM bytes: the codec's end-of-block tail
        // is 20 bytes, well short of one frame.
        assert_eq!(generator.generate(10)?, None);
        assert_eq!(generator.generate(0)?, None);

        let finished = generator.finish()?;
        assert_eq!(finished.frames, None);
        assert_eq!(finished.remainder.len(), 20);
        Ok(())
    }

    #[test]
    fn long_durations_are_aligned() -> anyhow::Result<()> {
        let mut generator = SilenceGenerator::new(
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
            &buffering_builder,
        )?;

        for duration in [173u64, 243, 500, 1000] {
            if let Some(frames) = generator.generate(duration)? {
                assert_eq!(frames.len() % MP3_FRAME_SIZE, 0);
            }
        }
        Ok(())
    }
}
