use thiserror::Error;

/// Failure to turn an encoded payload into a frame sample.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("empty frame payload")]
    Empty,

    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("unsupported image format: {format}")]
    Unsupported { format: String },

    #[error("malformed image data: {0}")]
    Malformed(String),

    #[error("region of interest contains no pixels")]
    EmptyRegion,
}

/// Reasons the full-window analysis produced no usable rate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("filter degenerate: {0}")]
    FilterDegenerate(String),

    #[error("insufficient peaks: found {found}, need {required}")]
    InsufficientPeaks { found: usize, required: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid config `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PulseError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
