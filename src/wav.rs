use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use sdrconvd_macros::{ToBytes, riff_chunk_type};

use crate::byteorder::WriteBytesLe;

const WAVE_FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Size of everything before the first sample: RIFF header, `fmt ` and `data` headers.
#[cfg(test)]
pub const HEADER_LEN: u64 = 44;

/// A chunk with a four byte id and a little-endian payload.
pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];

    fn chunk_data(&self) -> Vec<u8>;

    fn write_chunk<W: Write>(&self, dst: &mut W) -> io::Result<()> {
        let data = self.chunk_data();
        let size = u32::try_from(data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "chunk too large"))?;

        dst.write_all(self.chunk_id())?;
        dst.write_all(&size.to_le_bytes())?;
        dst.write_all(&data)?;
        if data.len() % 2 == 1 {
            dst.write_all(&[0])?;
        }
        Ok(())
    }
}

#[riff_chunk_type(b"fmt ")]
#[derive(ToBytes, Debug, Clone, Copy, PartialEq, Eq)]
struct FormatChunk {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FormatChunk {
    fn pcm16(sample_rate: u32, channels: u16) -> Self {
        let block_align = channels * BITS_PER_SAMPLE / 8;
        Self {
            audio_format: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
        }
    }
}

/// RIFF/WAVE writer for interleaved signed 16-bit PCM.
///
/// Chunk sizes are written as placeholders by [`write_header`](Self::write_header)
/// and patched in [`finish`](Self::finish), so the target must be seekable.
pub struct WAVWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    format: FormatChunk,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
    header_written: bool,
}

impl<W: Write + Seek> WAVWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            format: FormatChunk::pcm16(8000, 1),
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
            header_written: false,
        }
    }

    pub fn configure_audio_format(&mut self, sample_rate: u32, channels: u16) -> io::Result<()> {
        if self.header_written {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot change format after writing the header",
            ));
        }
        if sample_rate == 0 || channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Sample rate and channel count must be non-zero",
            ));
        }

        self.format = FormatChunk::pcm16(sample_rate, channels);
        Ok(())
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(b"WAVE")?;

        self.format.write_chunk(&mut self.writer)?;

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?;

        self.header_written = true;
        Ok(())
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        samples.write_le(&mut bytes);
        self.writer.write_all(&bytes)?;
        self.data_written += bytes.len() as u64;
        Ok(())
    }

    /// Pads the data chunk and patches both size fields.
    ///
    /// Sizes saturate at `u32::MAX` for captures beyond the 4 GiB RIFF limit.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.data_written % 2 == 1 {
            self.writer.write_all(&[0])?;
        }
        self.writer.flush()?;

        let end = self.writer.stream_position()?;
        let data_size = u32::try_from(self.data_written).unwrap_or(u32::MAX);
        let riff_size = u32::try_from(end.saturating_sub(8)).unwrap_or(u32::MAX);
        if data_size == u32::MAX {
            log::warn!("WAV data exceeds 4 GiB, size fields are saturated");
        }

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn stats(&self) -> WAVStats {
        WAVStats {
            data_written: self.data_written,
            sample_rate: self.format.sample_rate,
            channels: self.format.channels,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WAVStats {
    pub data_written: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl WAVStats {
    pub fn frames(&self) -> u64 {
        self.data_written / (self.channels as u64 * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32_at(buffer: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buffer[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn format_chunk_layout() {
        let chunk = FormatChunk::pcm16(2_400_000, 1);
        let mut bytes = Vec::new();
        chunk.write_chunk(&mut bytes).unwrap();

        assert_eq!(&bytes[0..4], b"fmt ");
        assert_eq!(u32_at(&bytes, 4), 16);
        assert_eq!(bytes.len(), 24);
        assert_eq!(u32_at(&bytes, 12), 2_400_000);
        assert_eq!(u32_at(&bytes, 16), 4_800_000);
    }

    #[test]
    fn header_and_sizes() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.configure_audio_format(8000, 1)?;
        writer.write_header()?;
        writer.write_samples(&[0, 1, -1])?;
        assert_eq!(writer.stats().frames(), 3);
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();
        assert_eq!(buffer.len() as u64, HEADER_LEN + 6);
        assert_eq!(&buffer[0..4], b"RIFF");
        assert_eq!(&buffer[8..12], b"WAVE");
        assert_eq!(&buffer[36..40], b"data");
        assert_eq!(u32_at(&buffer, 4), buffer.len() as u32 - 8);
        assert_eq!(u32_at(&buffer, 40), 6);
        assert_eq!(&buffer[44..], &[0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF]);
        Ok(())
    }

    #[test]
    fn format_is_fixed_after_header() -> io::Result<()> {
        let mut writer = WAVWriter::new(Cursor::new(Vec::new()));
        writer.write_header()?;
        assert!(writer.configure_audio_format(44100, 2).is_err());
        Ok(())
    }
}
