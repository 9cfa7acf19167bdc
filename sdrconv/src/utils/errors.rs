#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Encoder rejected configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Input chunk of {actual} bytes exceeds encoder input size {max}")]
    InputTooLarge { actual: usize, max: usize },

    #[error("Input chunk of {0} bytes is not a whole number of 16-bit samples")]
    MisalignedInput(usize),

    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    OutputTooSmall { needed: usize, available: usize },

    #[error("Encoder failure: {0}")]
    Internal(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ResampleError {
    #[error("Unsupported resample ratio {from} Hz -> {to} Hz")]
    UnsupportedRatio { from: u32, to: u32 },

    #[error("Resampler construction failed: {0}")]
    Construction(String),

    #[error("Resampler processing failed: {0}")]
    Process(String),
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("Chunk at byte offset {offset} failed to encode: {source}")]
    ChunkFailed { offset: usize, source: CodecError },

    #[error("End-of-block flush failed: {0}")]
    FinishFailed(CodecError),

    #[error("Resampling failed: {0}")]
    Resample(#[from] ResampleError),

    #[error("Encoder construction failed: {0}")]
    Build(CodecError),
}

#[derive(thiserror::Error, Debug)]
pub enum AlignError {
    #[error("Frame size must be non-zero")]
    ZeroFrameSize,
}
