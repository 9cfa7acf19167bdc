//! Block resampling ahead of the encoder.
//!
//! The encoder only sees [`Resampler`]; [`SincResampler`] is the stock
//! implementation on top of `rubato`.

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

use crate::utils::errors::ResampleError;

/// Input frames handed to `rubato` per process call.
pub const RESAMPLER_CHUNK_SIZE: usize = 1024;

/// Converts mono float blocks from one sample rate to another.
///
/// Implementations may buffer input across calls, so the number and size of
/// output blocks need not match the input.
pub trait Resampler: Send {
    fn resample(&mut self, blocks: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, ResampleError>;

    /// Drains any buffered input at end of stream.
    fn flush(&mut self) -> Result<Vec<f32>, ResampleError>;
}

/// Windowed-sinc resampler with fixed input chunks.
///
/// Input that does not fill a whole chunk is held until the next call or
/// [`flush`](Resampler::flush).
pub struct SincResampler {
    resampler: SincFixedIn<f32>,
    leftover: Vec<f32>,
    from: u32,
    to: u32,
    frames_in: u64,
    frames_out: u64,
}

impl std::fmt::Debug for SincResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SincResampler")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("leftover", &self.leftover.len())
            .finish()
    }
}

impl SincResampler {
    pub fn new(from: u32, to: u32) -> Result<Self, ResampleError> {
        if from == 0 || to == 0 {
            return Err(ResampleError::UnsupportedRatio { from, to });
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let ratio = to as f64 / from as f64;
        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLER_CHUNK_SIZE, 1)
            .map_err(|e| ResampleError::Construction(e.to_string()))?;

        Ok(Self {
            resampler,
            leftover: Vec::with_capacity(RESAMPLER_CHUNK_SIZE * 2),
            from,
            to,
            frames_in: 0,
            frames_out: 0,
        })
    }

    pub fn ratio(&self) -> f64 {
        self.to as f64 / self.from as f64
    }

    /// Output frames owed for everything consumed since the last flush.
    fn expected_output(&self) -> u64 {
        (self.frames_in as f64 * self.ratio()).round() as u64
    }
}

impl Resampler for SincResampler {
    fn resample(&mut self, blocks: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, ResampleError> {
        let prior_len = self.leftover.len();
        for block in blocks {
            self.leftover.extend_from_slice(block);
        }

        let resampler = &mut self.resampler;
        let (output, consumed) = process_pending(&mut self.leftover, prior_len, |remaining| {
            let input_needed = resampler.input_frames_next();
            if remaining.len() < input_needed {
                return Ok(None);
            }

            let input = [&remaining[..input_needed]];
            let out = resampler
                .process(&input[..], None)
                .map_err(|e| ResampleError::Process(e.to_string()))?;
            Ok(Some((input_needed, out.into_iter().next().unwrap_or_default())))
        })?;

        self.frames_in += consumed as u64;
        self.frames_out += output.iter().map(|c| c.len() as u64).sum::<u64>();
        Ok(output)
    }

    fn flush(&mut self) -> Result<Vec<f32>, ResampleError> {
        let mut tail = Vec::new();

        if !self.leftover.is_empty() {
            let input = [std::mem::take(&mut self.leftover)];
            self.frames_in += input[0].len() as u64;
            let out = self
                .resampler
                .process_partial(Some(&input[..]), None)
                .map_err(|e| ResampleError::Process(e.to_string()))?;
            tail.extend(out.into_iter().next().unwrap_or_default());
        }

        // Push silence through until the delay line has released every
        // sample owed for the consumed input.
        let owed = self.expected_output().saturating_sub(self.frames_out) as usize;
        while tail.len() < owed {
            let out = self
                .resampler
                .process_partial::<Vec<f32>>(None, None)
                .map_err(|e| ResampleError::Process(e.to_string()))?;
            let channel = out.into_iter().next().unwrap_or_default();
            if channel.is_empty() {
                break;
            }
            tail.extend(channel);
        }
        tail.truncate(owed);

        self.resampler.reset();
        self.frames_in = 0;
        self.frames_out = 0;
        Ok(tail)
    }
}

/// Runs `step` over `pending` until it reports that too little input remains.
///
/// `step` returns the number of samples it consumed and their output. Input is
/// drained only after every step succeeded; on error `pending` is cut back to
/// `prior_len`, dropping the samples appended by the failed call.
fn process_pending<F>(
    pending: &mut Vec<f32>,
    prior_len: usize,
    mut step: F,
) -> Result<(Vec<Vec<f32>>, usize), ResampleError>
where
    F: FnMut(&[f32]) -> Result<Option<(usize, Vec<f32>)>, ResampleError>,
{
    let mut output = Vec::new();
    let mut consumed = 0;

    loop {
        match step(&pending[consumed..]) {
            Ok(Some((0, _))) | Ok(None) => break,
            Ok(Some((used, out))) => {
                consumed += used;
                if !out.is_empty() {
                    output.push(out);
                }
            }
            Err(e) => {
                pending.truncate(prior_len);
                return Err(e);
            }
        }
    }

    pending.drain(..consumed);
    Ok((output, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_rates() {
        assert!(matches!(
            SincResampler::new(0, 8000),
            Err(ResampleError::UnsupportedRatio { .. })
        ));
    }

    #[test]
    fn holds_partial_chunks() -> anyhow::Result<()> {
        let mut resampler = SincResampler::new(8000, 22050)?;

        let out = resampler.resample(&[vec![0.0; RESAMPLER_CHUNK_SIZE / 2]])?;
        assert!(out.is_empty());

        let out = resampler.resample(&[vec![0.0; RESAMPLER_CHUNK_SIZE / 2]])?;
        assert_eq!(out.len(), 1);

        // The first chunk is shortened by the filter delay; later chunks are full.
        let out = resampler.resample(&[vec![0.0; RESAMPLER_CHUNK_SIZE]])?;
        assert_eq!(out.len(), 1);

        let produced = out[0].len() as f64;
        let expected = RESAMPLER_CHUNK_SIZE as f64 * resampler.ratio();
        assert!((produced - expected).abs() <= 2.0);
        Ok(())
    }

    #[test]
    fn flush_releases_delayed_samples() -> anyhow::Result<()> {
        let mut resampler = SincResampler::new(8000, 22050)?;
        let input_len = 2 * RESAMPLER_CHUNK_SIZE;

        let body: usize = resampler
            .resample(&[vec![0.3; input_len]])?
            .iter()
            .map(Vec::len)
            .sum();
        let tail = resampler.flush()?;
        assert!(!tail.is_empty());

        let expected = (input_len as f64 * resampler.ratio()).round() as usize;
        assert_eq!(body + tail.len(), expected);
        Ok(())
    }

    fn halving_step(
        fail_on: usize,
    ) -> impl FnMut(&[f32]) -> Result<Option<(usize, Vec<f32>)>, ResampleError> {
        let mut calls = 0;
        move |remaining| {
            calls += 1;
            if calls == fail_on {
                return Err(ResampleError::Process("filter failure".into()));
            }
            if remaining.len() < 4 {
                return Ok(None);
            }
            Ok(Some((4, remaining[..4].iter().step_by(2).copied().collect())))
        }
    }

    #[test]
    fn pending_input_drains_whole_steps() -> anyhow::Result<()> {
        let mut pending: Vec<f32> = (0..10).map(|i| i as f32).collect();

        let (output, consumed) = process_pending(&mut pending, 0, halving_step(0))?;
        assert_eq!(consumed, 8);
        assert_eq!(output, vec![vec![0.0, 2.0], vec![4.0, 6.0]]);
        assert_eq!(pending, vec![8.0, 9.0]);
        Ok(())
    }

    #[test]
    fn failed_step_discards_new_input() {
        let mut pending = vec![1.0; 3];
        pending.extend_from_slice(&[2.0; 20]);

        let result = process_pending(&mut pending, 3, halving_step(2));
        assert!(matches!(result, Err(ResampleError::Process(_))));
        assert_eq!(pending, vec![1.0; 3]);
    }

    #[test]
    fn flush_drains_leftover() -> anyhow::Result<()> {
        let mut resampler = SincResampler::new(8000, 44100)?;
        resampler.resample(&[vec![0.1; 100]])?;

        let tail = resampler.flush()?;
        assert!(!tail.is_empty());
        assert!(resampler.flush()?.is_empty());
        Ok(())
    }
}
