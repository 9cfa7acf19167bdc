//! Running DC bias estimation.
//!
//! A single-pole low-pass filter on the per-buffer mean. The tracked value is
//! exposed to consumers so the correction can be applied when samples are
//! finally read, without scanning the buffer twice.

/// Smoothing gain applied to each buffer's instantaneous DC delta.
///
/// Settles over roughly 1 / 0.007 ≈ 142 buffers.
pub const DC_FILTER_GAIN: f32 = 0.007;

/// Scales an offset in 12-bit sample units to the normalized [-1, 1] range.
pub const SCALE_SIGNED_12_BIT_TO_FLOAT: f32 = 1.0 / 2048.0;

/// Midpoint of an unsigned 12-bit sample.
pub const CENTER_12_BIT: f32 = 2048.0;

/// Midpoint of an unsigned 8-bit sample.
pub const CENTER_8_BIT: f64 = 127.0;

/// Scales an offset in 8-bit sample units to the normalized [-1, 1] range.
pub const SCALE_8_BIT: f64 = 128.0;

/// Exponential moving average of a sample stream's DC component.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DcTracker {
    average_dc: f32,
}

impl DcTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one buffer's normalized instantaneous DC into the running estimate.
    ///
    /// Returns the updated estimate.
    pub fn update(&mut self, instantaneous_dc: f32) -> f32 {
        let delta = instantaneous_dc - self.average_dc;
        self.average_dc += delta * DC_FILTER_GAIN;
        self.average_dc
    }

    /// Current normalized DC estimate.
    pub fn average_dc(&self) -> f32 {
        self.average_dc
    }
}

/// Normalized instantaneous DC for a buffer of unsigned 12-bit samples.
///
/// Returns `None` when `count` is zero.
pub fn instantaneous_dc_12_bit(sum: u64, count: usize) -> Option<f32> {
    if count == 0 {
        return None;
    }
    let mean = sum as f32 / count as f32;
    Some((mean - CENTER_12_BIT) * SCALE_SIGNED_12_BIT_TO_FLOAT)
}

/// Normalized instantaneous DC for a buffer of unsigned 8-bit samples.
///
/// Returns `None` for an empty buffer.
pub fn instantaneous_dc_8_bit(samples: &[u8]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    let mean = sum / samples.len() as f64;
    Some(((mean - CENTER_8_BIT) / SCALE_8_BIT) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_update_applies_gain() {
        let mut tracker = DcTracker::new();
        let bias = tracker.update(1.0);
        assert!((bias - DC_FILTER_GAIN).abs() < 1e-9);
        assert_eq!(tracker.average_dc(), bias);
    }

    #[test]
    fn converges_monotonically() {
        let target = 0.25f32;
        let mut tracker = DcTracker::new();
        let mut previous = tracker.average_dc();

        for _ in 0..700 {
            let bias = tracker.update(target);
            assert!(bias >= previous);
            assert!(bias <= target);
            previous = bias;
        }

        // (1 - 0.007)^700 ≈ 0.0073
        assert!((target - previous).abs() < target * 0.01);
    }

    #[test]
    fn tracks_negative_offsets() {
        let mut tracker = DcTracker::new();
        for _ in 0..1000 {
            tracker.update(-0.5);
        }
        assert!((tracker.average_dc() + 0.5).abs() < 0.005);
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert_eq!(instantaneous_dc_12_bit(0, 0), None);
        assert_eq!(instantaneous_dc_8_bit(&[]), None);
    }

    #[test]
    fn domain_normalization() {
        assert_eq!(instantaneous_dc_12_bit(2048 * 4, 4), Some(0.0));
        assert_eq!(instantaneous_dc_12_bit(4096 * 2, 2), Some(1.0));
        assert_eq!(instantaneous_dc_12_bit(0, 2), Some(-1.0));

        assert_eq!(instantaneous_dc_8_bit(&[127, 127]), Some(0.0));
        assert_eq!(instantaneous_dc_8_bit(&[255]), Some(1.0));
        assert_eq!(instantaneous_dc_8_bit(&[63, 63]), Some(-0.5));
    }
}
