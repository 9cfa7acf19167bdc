pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

macro_rules! impl_num_le {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t {
            #[inline]
            fn write_le(&self, dst: &mut Vec<u8>) {
                dst.extend_from_slice(&self.to_le_bytes());
            }
        }
    )+ }
}

impl_num_le!(u8, i8, u16, i16, u32, i32, u64, i64, f32);

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

impl<T: WriteBytesLe> WriteBytesLe for [T] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

#[cfg(test)]
mod tests {
    use crate::byteorder::WriteBytesLe;
    use sdrconvd_macros::ToBytes;

    #[derive(ToBytes)]
    struct Header {
        tag: [u8; 4],
        length: u32,
        format: u16,
    }

    #[test]
    fn derived_fields_are_little_endian() {
        let header = Header {
            tag: *b"data",
            length: 0x0102_0304,
            format: 0xFFFE,
        };

        let mut bytes = Vec::new();
        header.write_le(&mut bytes);

        assert_eq!(bytes, [b'd', b'a', b't', b'a', 0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn slices_write_in_order() {
        let mut bytes = Vec::new();
        [-2i16, 1][..].write_le(&mut bytes);
        assert_eq!(bytes, [0xFE, 0xFF, 0x01, 0x00]);
    }
}
