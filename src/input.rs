use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use anyhow::Result;

/// Capture source: a file, or stdin when the path is `-`.
pub struct InputReader {
    reader: Box<dyn Read>,
    total_len: Option<u64>,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let (reader, total_len): (Box<dyn Read>, _) = if input_path.as_ref().as_os_str() == "-" {
            (Box::new(io::stdin().lock()), None)
        } else {
            let file = File::open(input_path)?;
            let len = file.metadata().ok().map(|m| m.len());
            (Box::new(BufReader::new(file)), len)
        };

        Ok(Self { reader, total_len })
    }

    #[cfg(test)]
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            total_len: None,
        }
    }

    /// File length, when known up front.
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Fills `buffer` completely unless the stream ends first.
    ///
    /// Returns the number of bytes read; anything short of `buffer.len()`
    /// means end of input.
    pub fn read_full(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Feeds the input to `callback` in chunks of exactly `chunk_size` bytes.
    ///
    /// Only the last chunk may be shorter. The callback returns `Ok(false)`
    /// to stop early.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        if chunk_size == 0 {
            anyhow::bail!("Chunk size must be non-zero");
        }

        let mut buffer = vec![0u8; chunk_size];

        loop {
            let bytes_read = self.read_full(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            if !callback(&buffer[..bytes_read])? || bytes_read < chunk_size {
                break;
            }
        }

        Ok(())
    }
}
