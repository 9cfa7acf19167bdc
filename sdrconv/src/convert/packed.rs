//! Unpacking of 12-bit packed tuner samples.
//!
//! Every 3 input bytes carry two unsigned 12-bit samples:
//!
//! ```text
//! b1: AAAAAAAA   b2: AAAABBBB   b3: BBBBBBBB
//! sample0 = (b1 << 4) | (b2 >> 4)
//! sample1 = ((b2 & 0xF) << 8) | b3
//! ```
//!
//! A buffer whose length is not a multiple of 3 is truncated to the last
//! complete group. Both converters also fold the buffer mean into a
//! [`DcTracker`] so the caller can remove the DC offset later.

use log::trace;

use super::dc::{DcTracker, instantaneous_dc_12_bit};

/// Bytes consumed per packed group.
pub const BYTES_PER_GROUP: usize = 3;

/// Samples produced per packed group.
pub const SAMPLES_PER_GROUP: usize = 2;

/// Samples processed together by [`LaneParallelConverter`].
pub const LANES: usize = 16;

const GROUPS_PER_STEP: usize = LANES / SAMPLES_PER_GROUP;
const BYTES_PER_STEP: usize = GROUPS_PER_STEP * BYTES_PER_GROUP;

type LaneArray = [u16; GROUPS_PER_STEP];

/// Number of samples produced from `byte_len` packed input bytes.
pub const fn output_len(byte_len: usize) -> usize {
    byte_len / BYTES_PER_GROUP * SAMPLES_PER_GROUP
}

#[inline(always)]
fn unpack_group(b1: u8, b2: u8, b3: u8) -> (u16, u16) {
    let sample0 = ((b1 as u16) << 4) | ((b2 as u16) >> 4);
    let sample1 = (((b2 & 0x0F) as u16) << 8) | b3 as u16;
    (sample0, sample1)
}

/// Converts packed 12-bit buffers to 16-bit samples while tracking DC bias.
///
/// Implementations must produce identical samples and bias updates for the
/// same input; they differ only in throughput.
pub trait PackedSampleConverter: Send {
    /// Unpacks `buffer` and updates the DC estimate.
    ///
    /// An empty (or shorter than one group) buffer yields no samples and
    /// leaves the DC estimate untouched.
    fn convert(&mut self, buffer: &[u8]) -> Vec<i16>;

    /// Current normalized DC estimate, in [-1, 1].
    fn average_dc(&self) -> f32;
}

fn finish_buffer(tracker: &mut DcTracker, buffer: &[u8], sum: u64, count: usize) {
    let tail = buffer.len() % BYTES_PER_GROUP;
    if tail != 0 {
        trace!(
            "Ignoring {tail} trailing byte(s) of a {} byte packed buffer",
            buffer.len()
        );
    }

    if let Some(dc) = instantaneous_dc_12_bit(sum, count) {
        tracker.update(dc);
    }
}

/// Portable converter handling one packed group per iteration.
#[derive(Debug, Default)]
pub struct SequentialConverter {
    tracker: DcTracker,
}

impl SequentialConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackedSampleConverter for SequentialConverter {
    fn convert(&mut self, buffer: &[u8]) -> Vec<i16> {
        let mut samples = Vec::with_capacity(output_len(buffer.len()));
        let mut sum = 0u64;

        for group in buffer.chunks_exact(BYTES_PER_GROUP) {
            let (sample0, sample1) = unpack_group(group[0], group[1], group[2]);
            sum += sample0 as u64 + sample1 as u64;
            samples.push(sample0 as i16);
            samples.push(sample1 as i16);
        }

        finish_buffer(&mut self.tracker, buffer, sum, samples.len());
        samples
    }

    fn average_dc(&self) -> f32 {
        self.tracker.average_dc()
    }
}

/// Converter processing [`LANES`] samples per step.
///
/// High and low nibbles for a whole step are gathered into lane arrays and
/// combined lane-wise, followed by a lane-wise horizontal sum. Groups that do
/// not fill a complete step go through the scalar tail loop.
#[derive(Debug, Default)]
pub struct LaneParallelConverter {
    tracker: DcTracker,
}

impl LaneParallelConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackedSampleConverter for LaneParallelConverter {
    fn convert(&mut self, buffer: &[u8]) -> Vec<i16> {
        let mut samples = vec![0i16; output_len(buffer.len())];
        let mut sum = 0u64;

        let usable = buffer.len() - buffer.len() % BYTES_PER_GROUP;
        let steps = buffer[..usable].chunks_exact(BYTES_PER_STEP);
        let tail = steps.remainder();

        for (step, out) in steps.zip(samples.chunks_exact_mut(LANES)) {
            sum += lanes::unpack_step(step, out);
        }

        let offset = usable - tail.len();
        let mut index = output_len(offset);
        for group in tail.chunks_exact(BYTES_PER_GROUP) {
            let (sample0, sample1) = unpack_group(group[0], group[1], group[2]);
            sum += sample0 as u64 + sample1 as u64;
            samples[index] = sample0 as i16;
            samples[index + 1] = sample1 as i16;
            index += SAMPLES_PER_GROUP;
        }

        let count = samples.len();
        finish_buffer(&mut self.tracker, buffer, sum, count);
        samples
    }

    fn average_dc(&self) -> f32 {
        self.tracker.average_dc()
    }
}

/// Gathers one step of packed bytes into per-lane high/mid/low arrays.
#[inline(always)]
fn gather(step: &[u8]) -> (LaneArray, LaneArray, LaneArray) {
    let mut b1 = [0u16; GROUPS_PER_STEP];
    let mut b2 = [0u16; GROUPS_PER_STEP];
    let mut b3 = [0u16; GROUPS_PER_STEP];
    for (i, group) in step.chunks_exact(BYTES_PER_GROUP).enumerate() {
        b1[i] = group[0] as u16;
        b2[i] = group[1] as u16;
        b3[i] = group[2] as u16;
    }
    (b1, b2, b3)
}

#[cfg(feature = "simd")]
mod lanes {
    use std::simd::Simd;
    use std::simd::num::SimdUint;

    use super::{GROUPS_PER_STEP, gather};

    type Lane = Simd<u16, GROUPS_PER_STEP>;

    /// Unpacks one full step into `out` and returns the sum of its samples.
    #[inline(always)]
    pub(super) fn unpack_step(step: &[u8], out: &mut [i16]) -> u64 {
        let (b1, b2, b3) = gather(step);
        let b1 = Lane::from_array(b1);
        let b2 = Lane::from_array(b2);
        let b3 = Lane::from_array(b3);

        let even = (b1 << Lane::splat(4)) | (b2 >> Lane::splat(4));
        let odd = ((b2 & Lane::splat(0x0F)) << Lane::splat(8)) | b3;

        let sum = even.cast::<u32>().reduce_sum() + odd.cast::<u32>().reduce_sum();

        let even = even.to_array();
        let odd = odd.to_array();
        for i in 0..GROUPS_PER_STEP {
            out[2 * i] = even[i] as i16;
            out[2 * i + 1] = odd[i] as i16;
        }
        sum as u64
    }
}

#[cfg(not(feature = "simd"))]
mod lanes {
    use super::{GROUPS_PER_STEP, gather};

    /// Unpacks one full step into `out` and returns the sum of its samples.
    #[inline(always)]
    pub(super) fn unpack_step(step: &[u8], out: &mut [i16]) -> u64 {
        let (b1, b2, b3) = gather(step);

        let mut even = [0u16; GROUPS_PER_STEP];
        let mut odd = [0u16; GROUPS_PER_STEP];
        for i in 0..GROUPS_PER_STEP {
            even[i] = (b1[i] << 4) | (b2[i] >> 4);
            odd[i] = ((b2[i] & 0x0F) << 8) | b3[i];
        }

        let mut sum = 0u32;
        for i in 0..GROUPS_PER_STEP {
            sum += even[i] as u32 + odd[i] as u32;
        }

        for i in 0..GROUPS_PER_STEP {
            out[2 * i] = even[i] as i16;
            out[2 * i + 1] = odd[i] as i16;
        }
        sum as u64
    }
}

/// Selects a [`PackedSampleConverter`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Sequential,
    LaneParallel,
}

impl ConverterKind {
    /// Lane-parallel where the target has vector units, sequential otherwise.
    pub fn preferred() -> Self {
        if cfg!(any(
            feature = "simd",
            target_feature = "sse2",
            target_feature = "neon",
            target_feature = "simd128"
        )) {
            ConverterKind::LaneParallel
        } else {
            ConverterKind::Sequential
        }
    }

    pub fn build(self) -> Box<dyn PackedSampleConverter> {
        match self {
            ConverterKind::Sequential => Box::new(SequentialConverter::new()),
            ConverterKind::LaneParallel => Box::new(LaneParallelConverter::new()),
        }
    }
}
