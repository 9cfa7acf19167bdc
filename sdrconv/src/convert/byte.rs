//! Ingestion of 8-bit unsigned sample buffers.

use std::sync::Arc;

use super::dc::{CENTER_8_BIT, DcTracker, SCALE_8_BIT, instantaneous_dc_8_bit};

/// Copies raw 8-bit tuner buffers into [`NativeBuffer`]s.
///
/// Each call updates the running DC estimate from the buffer mean, then tags
/// the copy with that estimate. The correction itself is left to the
/// consumer, see [`NativeBuffer::corrected`].
///
/// # Example
///
/// ```rust
/// use sdrconv::convert::byte::ByteBufferIngestor;
///
/// let mut ingestor = ByteBufferIngestor::default();
/// let mut raw = vec![200u8; 1024];
///
/// let buffer = ingestor.ingest(&raw, 1_700_000_000_000);
/// raw.fill(0); // the ingested copy is unaffected
///
/// assert_eq!(buffer.as_ref()[0], 200);
/// assert!(buffer.average_dc() > 0.0);
/// ```
#[derive(Debug, Default)]
pub struct ByteBufferIngestor {
    tracker: DcTracker,
    buffers_processed: usize,
}

impl ByteBufferIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `samples` and tags the copy with `timestamp` and the updated DC.
    ///
    /// An empty input produces an empty buffer and leaves the DC estimate
    /// unchanged.
    pub fn ingest(&mut self, samples: &[u8], timestamp: u64) -> NativeBuffer {
        if let Some(dc) = instantaneous_dc_8_bit(samples) {
            self.tracker.update(dc);
            self.buffers_processed += 1;
        }

        NativeBuffer {
            samples: Arc::from(samples),
            timestamp,
            average_dc: self.tracker.average_dc(),
        }
    }

    pub fn average_dc(&self) -> f32 {
        self.tracker.average_dc()
    }

    pub fn buffers_processed(&self) -> usize {
        self.buffers_processed
    }
}

/// An immutable copy of one 8-bit tuner buffer.
#[derive(Debug, Clone)]
pub struct NativeBuffer {
    samples: Arc<[u8]>,
    timestamp: u64,
    average_dc: f32,
}

impl AsRef<[u8]> for NativeBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.samples
    }
}

impl NativeBuffer {
    /// Capture timestamp supplied at ingestion.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// DC estimate of the producing ingestor right after this buffer.
    pub fn average_dc(&self) -> f32 {
        self.average_dc
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Normalized samples with the tagged DC estimate removed.
    pub fn corrected(&self) -> impl Iterator<Item = f32> + '_ {
        let average_dc = self.average_dc;
        self.samples
            .iter()
            .map(move |&s| ((s as f64 - CENTER_8_BIT) / SCALE_8_BIT) as f32 - average_dc)
    }
}
