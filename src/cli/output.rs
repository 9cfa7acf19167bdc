use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::command::OutputFormat;
use crate::wav::{WAVStats, WAVWriter};

/// Appends `expected_ext` unless the path already carries it.
///
/// An existing different extension is kept, so `capture.bin` becomes
/// `capture.bin.wav` rather than overwriting part of the name.
pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match (base_path.extension(), base_path.file_name()) {
        (Some(existing), _) if existing == expected_ext => base_path.to_path_buf(),
        (Some(_), Some(name)) => {
            let mut path = base_path.to_path_buf();
            path.set_file_name(format!("{}.{expected_ext}", name.to_string_lossy()));
            path
        }
        _ => base_path.with_extension(expected_ext),
    }
}

/// Resolves where `unpack` writes, falling back to the input path.
pub fn resolve_output_path(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<PathBuf> {
    match output {
        Some(path) => Ok(create_path_with_extension(path, format.extension())),
        None if input.as_os_str() == "-" => {
            anyhow::bail!("--output-path is required when reading from stdin")
        }
        None => Ok(create_path_with_extension(input, format.extension())),
    }
}

pub enum PcmWriter {
    Pcm { writer: BufWriter<File>, written: u64 },
    Wav(WAVWriter<File>),
}

impl PcmWriter {
    pub fn create(path: &Path, format: OutputFormat, sample_rate: u32) -> Result<Self> {
        let file = File::create(path)?;
        Ok(match format {
            OutputFormat::Pcm => PcmWriter::Pcm {
                writer: BufWriter::new(file),
                written: 0,
            },
            OutputFormat::Wav => {
                let mut wav = WAVWriter::new(file);
                wav.configure_audio_format(sample_rate, 1)?;
                wav.write_header()?;
                PcmWriter::Wav(wav)
            }
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        match self {
            PcmWriter::Pcm { writer, written } => {
                for sample in samples {
                    writer.write_all(&sample.to_le_bytes())?;
                }
                *written += samples.len() as u64 * 2;
            }
            PcmWriter::Wav(wav) => wav.write_samples(samples)?,
        }
        Ok(())
    }

    /// Bytes of sample data written so far.
    pub fn data_written(&self) -> u64 {
        match self {
            PcmWriter::Pcm { written, .. } => *written,
            PcmWriter::Wav(wav) => wav.stats().data_written,
        }
    }

    pub fn finish(self) -> Result<Option<WAVStats>> {
        match self {
            PcmWriter::Pcm { mut writer, .. } => {
                writer.flush()?;
                Ok(None)
            }
            PcmWriter::Wav(mut wav) => {
                wav.finish()?;
                Ok(Some(wav.stats()))
            }
        }
    }
}
