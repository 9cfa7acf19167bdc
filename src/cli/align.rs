use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Result;
use indicatif::MultiProgress;
use log::Level;

use sdrconv::encode::aligner::FrameAligner;

use super::command::{AlignArgs, Cli};
use super::progress::create_progress_bar;
use crate::input::InputReader;

/// Counters reported once the stream is aligned.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AlignSummary {
    pub frames: u64,
    pub remainder: usize,
    pub remainder_written: bool,
}

pub fn cmd_align(args: &AlignArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Aligning {} to {}-byte frames",
        args.input.display(),
        args.frame_size
    );

    let mut input = InputReader::new(&args.input)?;
    let mut output = BufWriter::new(File::create(&args.output_path)?);

    let pb = multi
        .map(|m| create_progress_bar(m, input.total_len(), "aligning"))
        .transpose()?;

    let options = AlignOptions {
        frame_size: args.frame_size,
        chunk_size: args.chunk_size,
        keep_remainder: args.keep_remainder,
        fail_level: if cli.strict { Level::Warn } else { Level::Error },
    };
    let summary = align_stream(&mut input, &mut output, &options, |n| {
        if let Some(pb) = &pb {
            pb.inc(n);
        }
    })?;
    output.flush()?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    log::info!(
        "Wrote {} frame(s) to {}{}",
        summary.frames,
        args.output_path.display(),
        if summary.remainder_written {
            format!(" plus a {} byte partial frame", summary.remainder)
        } else {
            String::new()
        }
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AlignOptions {
    pub frame_size: usize,
    pub chunk_size: usize,
    pub keep_remainder: bool,
    pub fail_level: Level,
}

/// Streams `input` through a [`FrameAligner`] into `output`.
pub fn align_stream<W: Write>(
    input: &mut InputReader,
    output: &mut W,
    options: &AlignOptions,
    mut on_read: impl FnMut(u64),
) -> Result<AlignSummary> {
    let frame_size = options.frame_size;
    let mut aligner = FrameAligner::new(frame_size)?;
    let mut summary = AlignSummary::default();

    input.process_chunks(options.chunk_size, |chunk| {
        if let Some(frames) = aligner.push(chunk) {
            output.write_all(&frames)?;
            summary.frames += (frames.len() / frame_size) as u64;
        }
        on_read(chunk.len() as u64);
        Ok(true)
    })?;

    let remainder = aligner.take_carry();
    summary.remainder = remainder.len();
    if remainder.is_empty() {
        return Ok(summary);
    }

    if options.keep_remainder {
        output.write_all(&remainder)?;
        summary.remainder_written = true;
        log::info!("Appended {} byte partial frame", remainder.len());
    } else {
        sdrconv::log_or_err!(
            options,
            Level::Warn,
            anyhow::anyhow!(
                "Dropped {} trailing byte(s) short of a {frame_size}-byte frame",
                remainder.len()
            )
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(data: Vec<u8>, keep: bool, fail_level: Level) -> Result<(AlignSummary, Vec<u8>)> {
        let options = AlignOptions {
            frame_size: 144,
            chunk_size: 100,
            keep_remainder: keep,
            fail_level,
        };
        let mut input = InputReader::from_reader(Cursor::new(data));
        let mut output = Vec::new();
        let summary = align_stream(&mut input, &mut output, &options, |_| {})?;
        Ok((summary, output))
    }

    #[test]
    fn drops_remainder_by_default() -> Result<()> {
        let data: Vec<u8> = (0..350u32).map(|i| i as u8).collect();
        let (summary, output) = run(data.clone(), false, Level::Error)?;

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.remainder, 62);
        assert!(!summary.remainder_written);
        assert_eq!(output, &data[..288]);
        Ok(())
    }

    #[test]
    fn keeps_remainder_on_request() -> Result<()> {
        let data = vec![7u8; 150];
        let (summary, output) = run(data.clone(), true, Level::Error)?;

        assert_eq!(summary.frames, 1);
        assert!(summary.remainder_written);
        assert_eq!(output, data);
        Ok(())
    }

    #[test]
    fn strict_mode_rejects_remainder() {
        assert!(run(vec![0u8; 10], false, Level::Warn).is_err());
        assert!(run(vec![0u8; 288], false, Level::Warn).is_ok());
    }
}
