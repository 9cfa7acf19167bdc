use anyhow::Result;
use indicatif::MultiProgress;
use log::Level;
use serde::Serialize;

use super::capture::{CaptureConverter, CaptureStats};
use super::command::{Cli, InfoArgs, ReportFormat, SampleFormat};
use super::progress::create_progress_bar;
use crate::input::InputReader;
use crate::timestamp::time_str;

/// Number of DC snapshots kept for the report.
const DC_HISTORY_POINTS: u64 = 16;

#[derive(Debug, Serialize)]
struct CaptureReport {
    input: String,
    format: &'static str,
    sample_rate: u32,
    converter: String,
    duration_seconds: f64,
    #[serde(flatten)]
    stats: CaptureStats,
    /// `(buffer index, DC estimate)` pairs sampled evenly over the capture.
    dc_history: Vec<(u64, f32)>,
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let capture = &args.capture;
    log::info!("Analyzing capture: {}", capture.input.display());

    let mut converter = CaptureConverter::from_args(capture, false);
    if cli.strict {
        converter.set_fail_level(Level::Warn);
    }
    let read_size = converter.read_size(capture.chunk_size)?;

    let mut input = InputReader::new(&capture.input)?;
    let expected_buffers = input
        .total_len()
        .map(|len| len.div_ceil(read_size as u64).max(1));
    let history_stride = expected_buffers.map_or(1, |n| (n / DC_HISTORY_POINTS).max(1));

    let pb = multi
        .map(|m| create_progress_bar(m, input.total_len(), "analyzing"))
        .transpose()?;

    let mut dc_history = Vec::new();
    input.process_chunks(read_size, |chunk| {
        converter.convert(chunk)?;

        let stats = converter.stats();
        if (stats.buffers - 1) % history_stride == 0 {
            dc_history.push((stats.buffers - 1, stats.average_dc));
        }
        if let Some(pb) = &pb {
            pb.inc(chunk.len() as u64);
        }
        Ok(true)
    })?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let stats = converter.stats().clone();
    if stats.bytes == 0 {
        println!("Capture is empty.");
        return Ok(());
    }

    let report = CaptureReport {
        input: capture.input.display().to_string(),
        format: match capture.format {
            SampleFormat::Packed12 => "packed12",
            SampleFormat::U8 => "u8",
        },
        sample_rate: capture.sample_rate,
        converter: format!("{:?}", capture.converter.kind()),
        duration_seconds: stats.samples as f64 / capture.sample_rate as f64,
        stats,
        dc_history,
    };

    match args.report {
        ReportFormat::Text => print_text(&report),
        ReportFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
    }

    Ok(())
}

fn print_text(report: &CaptureReport) {
    let stats = &report.stats;

    println!("Capture: {}", report.input);
    println!("  Format: {} at {} Hz", report.format, report.sample_rate);
    println!("  Converter: {}", report.converter);
    println!("  Bytes: {} in {} buffers", stats.bytes, stats.buffers);
    println!("  Samples: {}", stats.samples);
    println!("  Duration: {}", time_str(report.duration_seconds));
    if let (Some(min), Some(max)) = (stats.min_sample, stats.max_sample) {
        println!("  Raw range: {min}..={max}");
    }
    println!("  DC estimate: {:.6}", stats.average_dc);
    if stats.trailing_bytes > 0 {
        println!("  Trailing bytes: {}", stats.trailing_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_report_flattens_stats() -> Result<()> {
        let report = CaptureReport {
            input: "capture.bin".to_string(),
            format: "u8",
            sample_rate: 8000,
            converter: "Sequential".to_string(),
            duration_seconds: 0.5,
            stats: CaptureStats {
                bytes: 4000,
                buffers: 1,
                samples: 4000,
                ..CaptureStats::default()
            },
            dc_history: vec![(0, 0.25)],
        };

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("samples: 4000"));
        assert!(yaml.contains("format: u8"));
        assert!(yaml.contains("min_sample: null"));
        Ok(())
    }
}
