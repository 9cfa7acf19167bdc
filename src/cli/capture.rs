use anyhow::Result;
use log::Level;
use serde::Serialize;

use sdrconv::convert::byte::ByteBufferIngestor;
use sdrconv::convert::dc::{CENTER_8_BIT, CENTER_12_BIT, SCALE_8_BIT};
use sdrconv::convert::packed::{BYTES_PER_GROUP, ConverterKind, PackedSampleConverter};
use sdrconv::log_or_err;
use sdrconv::utils::pcm::float_to_i16;

use super::command::{CaptureArgs, SampleFormat};

/// 12-bit samples are widened to 16 bits by this factor.
const PACKED_TO_16_BIT: f32 = 16.0;

enum Source {
    Packed(Box<dyn PackedSampleConverter>),
    Byte(ByteBufferIngestor),
}

/// Running statistics over a converted capture.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureStats {
    pub bytes: u64,
    pub buffers: u64,
    pub samples: u64,
    /// Bytes dropped because they did not complete a packed group.
    pub trailing_bytes: u64,
    /// Smallest raw sample value seen.
    pub min_sample: Option<u16>,
    /// Largest raw sample value seen.
    pub max_sample: Option<u16>,
    pub average_dc: f32,
}

impl CaptureStats {
    fn observe_raw(&mut self, min: u16, max: u16) {
        self.min_sample = Some(self.min_sample.map_or(min, |m| m.min(min)));
        self.max_sample = Some(self.max_sample.map_or(max, |m| m.max(max)));
    }
}

/// Turns capture buffers into centered signed 16-bit PCM.
pub struct CaptureConverter {
    source: Source,
    remove_dc: bool,
    fail_level: Level,
    stats: CaptureStats,
}

impl CaptureConverter {
    pub fn new(format: SampleFormat, kind: ConverterKind, remove_dc: bool) -> Self {
        let source = match format {
            SampleFormat::Packed12 => Source::Packed(kind.build()),
            SampleFormat::U8 => Source::Byte(ByteBufferIngestor::new()),
        };

        Self {
            source,
            remove_dc,
            fail_level: Level::Error,
            stats: CaptureStats::default(),
        }
    }

    pub fn from_args(args: &CaptureArgs, remove_dc: bool) -> Self {
        Self::new(args.format, args.converter.kind(), remove_dc)
    }

    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    /// Chunk size to read with, so that packed groups never straddle two reads.
    pub fn read_size(&self, requested: usize) -> Result<usize> {
        match self.source {
            Source::Packed(_) => {
                let size = requested / BYTES_PER_GROUP * BYTES_PER_GROUP;
                if size == 0 {
                    anyhow::bail!(
                        "Chunk size {requested} is smaller than one {BYTES_PER_GROUP}-byte group"
                    );
                }
                if size != requested {
                    log::debug!("Chunk size rounded down from {requested} to {size}");
                }
                Ok(size)
            }
            Source::Byte(_) => {
                if requested == 0 {
                    anyhow::bail!("Chunk size must be non-zero");
                }
                Ok(requested)
            }
        }
    }

    /// Converts one capture buffer. Only the final buffer may end mid-group.
    pub fn convert(&mut self, chunk: &[u8]) -> Result<Vec<i16>> {
        self.stats.bytes += chunk.len() as u64;
        self.stats.buffers += 1;
        let remove_dc = self.remove_dc;

        let pcm = match &mut self.source {
            Source::Packed(converter) => {
                let trailing = chunk.len() % BYTES_PER_GROUP;
                if trailing != 0 {
                    self.stats.trailing_bytes += trailing as u64;
                    log_or_err!(
                        self,
                        Level::Warn,
                        anyhow::anyhow!(
                            "Capture ends with {trailing} byte(s) outside a whole sample group"
                        )
                    );
                }

                let samples = converter.convert(chunk);
                let offset = if remove_dc {
                    CENTER_12_BIT + converter.average_dc() * CENTER_12_BIT
                } else {
                    CENTER_12_BIT
                };

                if let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) {
                    self.stats.observe_raw(min as u16, max as u16);
                }
                self.stats.average_dc = converter.average_dc();

                samples
                    .iter()
                    .map(|&s| {
                        let centered = (s as f32 - offset) * PACKED_TO_16_BIT;
                        centered.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
                    })
                    .collect::<Vec<_>>()
            }
            Source::Byte(ingestor) => {
                let buffer = ingestor.ingest(chunk, self.stats.buffers - 1);

                if let (Some(&min), Some(&max)) = (chunk.iter().min(), chunk.iter().max()) {
                    self.stats.observe_raw(min as u16, max as u16);
                }
                self.stats.average_dc = buffer.average_dc();

                if remove_dc {
                    buffer.corrected().map(float_to_i16).collect()
                } else {
                    chunk
                        .iter()
                        .map(|&s| float_to_i16(((s as f64 - CENTER_8_BIT) / SCALE_8_BIT) as f32))
                        .collect()
                }
            }
        };

        self.stats.samples += pcm.len() as u64;
        Ok(pcm)
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }
}
