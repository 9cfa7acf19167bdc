//! PCM sample packing helpers.

/// Full-scale multiplier for converting normalized floats to signed 16-bit.
pub const SCALE_FLOAT_TO_SIGNED_16_BIT: f32 = 32767.0;

/// Converts a normalized float sample to signed 16-bit, clamping to full scale.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * SCALE_FLOAT_TO_SIGNED_16_BIT).round() as i16
}

/// Converts a block of normalized floats to signed 16-bit little-endian bytes.
///
/// The output holds two bytes per input sample.
pub fn to_signed_16_bit_le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&float_to_i16(sample).to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_and_scales() {
        assert_eq!(float_to_i16(0.0), 0);
        assert_eq!(float_to_i16(1.0), 32767);
        assert_eq!(float_to_i16(-1.0), -32767);
        assert_eq!(float_to_i16(2.5), 32767);
        assert_eq!(float_to_i16(-7.0), -32767);
        assert_eq!(float_to_i16(f32::NAN), 0);
    }

    #[test]
    fn little_endian_layout() {
        let bytes = to_signed_16_bit_le(&[1.0, -1.0, 0.0]);
        assert_eq!(bytes, vec![0xFF, 0x7F, 0x01, 0x80, 0x00, 0x00]);
        assert!(to_signed_16_bit_le(&[]).is_empty());
    }
}
