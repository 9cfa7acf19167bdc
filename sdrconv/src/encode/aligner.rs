use crate::encode::codec::{MP3_FRAME_SIZE, Mp3Codec};
use crate::encode::encoder::StreamingAudioEncoder;
use crate::utils::errors::{AlignError, EncodeError};

/// Releases bytes only in whole multiples of a fixed frame size.
///
/// Bytes that do not complete a frame are carried into the next
/// [`push`](Self::push). Across a whole session the released bytes plus the
/// final [`carry`](Self::carry) always add up to everything pushed.
///
/// # Example
///
/// ```rust
/// use sdrconv::encode::aligner::FrameAligner;
///
/// let mut aligner = FrameAligner::default();
///
/// assert_eq!(aligner.push(&[0u8; 100]), None);
/// assert_eq!(aligner.push(&[0u8; 50]).map(|f| f.len()), Some(144));
/// assert_eq!(aligner.carry_len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct FrameAligner {
    frame_size: usize,
    carry: Vec<u8>,
    pushed_bytes: u64,
    emitted_bytes: u64,
}

impl Default for FrameAligner {
    fn default() -> Self {
        Self {
            frame_size: MP3_FRAME_SIZE,
            carry: Vec::new(),
            pushed_bytes: 0,
            emitted_bytes: 0,
        }
    }
}

impl FrameAligner {
    pub fn new(frame_size: usize) -> Result<Self, AlignError> {
        if frame_size == 0 {
            return Err(AlignError::ZeroFrameSize);
        }

        Ok(Self {
            frame_size,
            ..Self::default()
        })
    }

    /// Appends `encoded` to the carried bytes and releases every complete frame.
    ///
    /// Returns `None` when no complete frame is available yet.
    pub fn push(&mut self, encoded: &[u8]) -> Option<Vec<u8>> {
        self.pushed_bytes += encoded.len() as u64;

        let mut frames = std::mem::take(&mut self.carry);
        frames.extend_from_slice(encoded);

        let aligned = frames.len() / self.frame_size * self.frame_size;
        if aligned == 0 {
            self.carry = frames;
            return None;
        }

        self.carry = frames.split_off(aligned);
        self.emitted_bytes += aligned as u64;
        Some(frames)
    }

    /// Pushes several encoder chunks as one contiguous run.
    pub fn push_all<T: AsRef<[u8]>>(&mut self, chunks: &[T]) -> Option<Vec<u8>> {
        let joined: Vec<u8> = chunks
            .iter()
            .flat_map(|chunk| chunk.as_ref().iter().copied())
            .collect();
        self.push(&joined)
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Bytes held back because they do not complete a frame.
    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }

    /// Removes and returns the carried bytes.
    pub fn take_carry(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.carry)
    }

    pub fn pushed_bytes(&self) -> u64 {
        self.pushed_bytes
    }

    pub fn emitted_bytes(&self) -> u64 {
        self.emitted_bytes
    }
}

/// Encoder front end whose output is always frame aligned.
///
/// Wraps a [`StreamingAudioEncoder`] with a [`FrameAligner`] so that
/// downstream consumers never see a partial frame.
#[derive(Debug)]
pub struct FrameAlignedAccumulator<C: Mp3Codec> {
    encoder: StreamingAudioEncoder<C>,
    aligner: FrameAligner,
}

/// Output of [`FrameAlignedAccumulator::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finished {
    /// Whole frames released by the final flush.
    pub frames: Option<Vec<u8>>,
    /// Trailing bytes that never completed a frame.
    pub remainder: Vec<u8>,
}

impl<C: Mp3Codec> FrameAlignedAccumulator<C> {
    pub fn new(encoder: StreamingAudioEncoder<C>) -> Self {
        Self {
            encoder,
            aligner: FrameAligner::default(),
        }
    }

    pub fn with_frame_size(
        encoder: StreamingAudioEncoder<C>,
        frame_size: usize,
    ) -> Result<Self, AlignError> {
        Ok(Self {
            encoder,
            aligner: FrameAligner::new(frame_size)?,
        })
    }

    /// Encodes `blocks` and returns the whole frames available so far.
    pub fn convert(&mut self, blocks: &[Vec<f32>]) -> Result<Option<Vec<u8>>, EncodeError> {
        let encoded = self.encoder.encode(blocks)?;
        Ok(self.aligner.push_all(&encoded))
    }

    /// Flushes the encoder and returns any whole frames that completes.
    ///
    /// The sub-frame remainder stays in the carry; see [`finish`](Self::finish).
    pub fn flush(&mut self) -> Result<Option<Vec<u8>>, EncodeError> {
        let flushed = self.encoder.flush()?;
        Ok(self.aligner.push_all(&flushed))
    }

    /// Flushes the encoder once more and hands back the trailing remainder.
    pub fn finish(mut self) -> Result<Finished, EncodeError> {
        let frames = self.flush()?;
        let remainder = self.aligner.take_carry();
        if !remainder.is_empty() {
            log::debug!(
                "Stream ended with {} byte(s) short of a {} byte frame",
                remainder.len(),
                self.aligner.frame_size()
            );
        }

        Ok(Finished { frames, remainder })
    }

    pub fn aligner(&self) -> &FrameAligner {
        &self.aligner
    }

    pub fn encoder(&self) -> &StreamingAudioEncoder<C> {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut StreamingAudioEncoder<C> {
        &mut self.encoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::codec::testing::{BufferingCodec, PCM_BYTES_PER_FRAME};
    use crate::encode::settings::{AudioSampleRate, Mp3Setting};

    #[test]
    fn carries_partial_frames() {
        let mut aligner = FrameAligner::default();

        assert_eq!(aligner.push(&[1u8; 100]), None);
        assert_eq!(aligner.carry_len(), 100);

        let frames = aligner.push(&[2u8; 50]).unwrap();
        assert_eq!(frames.len(), 144);
        assert_eq!(&frames[..100], &[1u8; 100][..]);
        assert_eq!(&frames[100..], &[2u8; 44][..]);
        assert_eq!(aligner.carry(), &[2u8; 6][..]);

        let frames = aligner.push(&[3u8; 200]).unwrap();
        assert_eq!(frames.len(), 144);
        assert_eq!(aligner.carry_len(), 62);
    }

    #[test]
    fn exact_multiple_clears_carry() {
        let mut aligner = FrameAligner::default();
        aligner.push(&[0u8; 44]);

        let frames = aligner.push(&[0u8; 244]).unwrap();
        assert_eq!(frames.len(), 288);
        assert!(aligner.carry().is_empty());
    }

    #[test]
    fn empty_push_is_noop() {
        let mut aligner = FrameAligner::default();
        assert_eq!(aligner.push(&[]), None);
        assert_eq!(aligner.carry_len(), 0);

        aligner.push(&[9u8; 10]);
        assert_eq!(aligner.push(&[]), None);
        assert_eq!(aligner.carry(), &[9u8; 10][..]);
    }

    #[test]
    fn rejects_zero_frame_size() {
        assert!(matches!(FrameAligner::new(0), Err(AlignError::ZeroFrameSize)));
    }

    #[test]
    fn conserves_bytes_across_calls() {
        let mut aligner = FrameAligner::default();
        let mut state = 12345u32;
        let mut total_in = 0u64;
        let mut total_out = 0u64;

        for _ in 0..2000 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let len = (state >> 16) as usize % 700;
            total_in += len as u64;

            if let Some(frames) = aligner.push(&vec![0xA5; len]) {
                assert!(!frames.is_empty());
                assert_eq!(frames.len() % 144, 0);
                total_out += frames.len() as u64;
            }
            assert!(aligner.carry_len() < 144);
        }

        assert_eq!(total_out + aligner.carry_len() as u64, total_in);
        assert_eq!(aligner.pushed_bytes(), total_in);
        assert_eq!(aligner.emitted_bytes(), total_out);
    }

    #[test]
    fn preserves_byte_order() {
        let mut aligner = FrameAligner::new(4).unwrap();
        let input: Vec<u8> = (0..=22).collect();

        let mut output = Vec::new();
        for chunk in input.chunks(5) {
            if let Some(frames) = aligner.push(chunk) {
                output.extend(frames);
            }
        }
        output.extend(aligner.take_carry());
        assert_eq!(output, input);
    }

    #[test]
    fn accumulator_releases_whole_frames() -> anyhow::Result<()> {
        let encoder = StreamingAudioEncoder::with_codec(
            BufferingCodec::new(PCM_BYTES_PER_FRAME),
            AudioSampleRate::Sr8000,
            Mp3Setting::Cbr16,
        )?;
        let mut accumulator = FrameAlignedAccumulator::new(encoder);

        let mut released = 0usize;
        for len in [100usize, 777, 1500, 3, 4096, 0, 2222] {
            if let Some(frames) = accumulator.convert(&[vec![0.3; len]])? {
                assert_eq!(frames.len() % MP3_FRAME_SIZE, 0);
                released += frames.len();
            }
        }

        let produced = accumulator.encoder().bytes_out();
        let finished = accumulator.finish()?;
        if let Some(frames) = &finished.frames {
            assert_eq!(frames.len() % MP3_FRAME_SIZE, 0);
            released += frames.len();
        }

        assert!(finished.remainder.len() < MP3_FRAME_SIZE);
        assert_eq!(released + finished.remainder.len(), produced);
        Ok(())
    }
}
