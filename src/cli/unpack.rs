use anyhow::Result;
use indicatif::MultiProgress;
use log::Level;

use super::capture::CaptureConverter;
use super::command::{Cli, UnpackArgs};
use super::output::{PcmWriter, resolve_output_path};
use super::progress::create_progress_bar;
use crate::input::InputReader;
use crate::timestamp::time_str;

pub fn cmd_unpack(args: &UnpackArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let capture = &args.capture;
    let output_path = resolve_output_path(
        &capture.input,
        args.output_path.as_deref(),
        args.output_format,
    )?;

    let mut converter = CaptureConverter::from_args(capture, args.remove_dc);
    if cli.strict {
        converter.set_fail_level(Level::Warn);
    }
    let read_size = converter.read_size(capture.chunk_size)?;

    let mut input = InputReader::new(&capture.input)?;
    let mut writer = PcmWriter::create(&output_path, args.output_format, capture.sample_rate)?;

    log::info!(
        "Unpacking {} ({:?}, {:?} converter) to {}",
        capture.input.display(),
        capture.format,
        capture.converter.kind(),
        output_path.display()
    );

    let pb = multi
        .map(|m| create_progress_bar(m, input.total_len(), "unpacking"))
        .transpose()?;

    let start = std::time::Instant::now();
    input.process_chunks(read_size, |chunk| {
        let pcm = converter.convert(chunk)?;
        writer.write_samples(&pcm)?;

        if let Some(pb) = &pb {
            pb.inc(chunk.len() as u64);
        }
        Ok(true)
    })?;

    let data_written = writer.data_written();
    if let Some(wav) = writer.finish()? {
        log::debug!(
            "WAV data: {} frames, {} channel(s) at {} Hz",
            wav.frames(),
            wav.channels,
            wav.sample_rate
        );
    }
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let stats = converter.stats();
    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Wrote {} samples ({} bytes, {} of signal) in {:.3}s, final DC estimate {:.6}",
        stats.samples,
        data_written,
        time_str(stats.samples as f64 / capture.sample_rate as f64),
        elapsed,
        stats.average_dc
    );
    if stats.trailing_bytes > 0 {
        log::warn!("Dropped {} trailing byte(s)", stats.trailing_bytes);
    }

    Ok(())
}
