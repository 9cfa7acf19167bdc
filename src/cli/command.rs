use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use sdrconv::convert::packed::ConverterKind;
use sdrconv::encode::codec::MP3_FRAME_SIZE;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for unpacking SDR tuner captures and aligning MP3 frame streams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a raw tuner capture into signed 16-bit PCM.
    Unpack(UnpackArgs),

    /// Print capture statistics.
    Info(InfoArgs),

    /// Cut a raw MP3 byte stream into whole frames.
    Align(AlignArgs),
}

/// Options shared by every command that reads a tuner capture.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Raw tuner capture (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Sample layout of the capture.
    #[arg(long, value_enum, default_value_t = SampleFormat::Packed12)]
    pub format: SampleFormat,

    /// Tuner sample rate in Hz.
    #[arg(long, value_name = "HZ", default_value_t = 2_400_000)]
    pub sample_rate: u32,

    /// Bytes per converted buffer. Packed captures round this down to whole 3-byte groups.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub chunk_size: usize,

    /// Packed sample converter.
    #[arg(long, value_enum, default_value_t = ConverterChoice::Auto)]
    pub converter: ConverterChoice,
}

#[derive(Debug, Args)]
pub struct UnpackArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Output file path. Defaults to the input path with the output extension.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Container for the PCM output.
    #[arg(long, value_enum, default_value_t = OutputFormat::Wav)]
    pub output_format: OutputFormat,

    /// Subtract the running DC estimate from every sample.
    #[arg(long)]
    pub remove_dc: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Report layout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

#[derive(Debug, Args)]
pub struct AlignArgs {
    /// Raw encoder output (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination for the aligned frames.
    #[arg(long, value_name = "PATH")]
    pub output_path: PathBuf,

    /// Frame size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = MP3_FRAME_SIZE)]
    pub frame_size: usize,

    /// Bytes read per push.
    #[arg(long, value_name = "BYTES", default_value_t = 4096)]
    pub chunk_size: usize,

    /// Append the trailing partial frame instead of dropping it.
    #[arg(long)]
    pub keep_remainder: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SampleFormat {
    /// Two 12-bit samples packed into every 3 bytes.
    Packed12,
    /// Unsigned 8-bit samples centered at 127.
    U8,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// RIFF/WAVE, 16-bit mono.
    Wav,
    /// Headerless 16-bit little-endian.
    Pcm,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Pcm => "pcm",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ConverterChoice {
    /// Lane-parallel when the target supports it.
    Auto,
    Sequential,
    LaneParallel,
}

impl ConverterChoice {
    pub fn kind(self) -> ConverterKind {
        match self {
            ConverterChoice::Auto => ConverterKind::preferred(),
            ConverterChoice::Sequential => ConverterKind::Sequential,
            ConverterChoice::LaneParallel => ConverterKind::LaneParallel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable summary.
    Text,
    /// YAML document on stdout.
    Yaml,
}
