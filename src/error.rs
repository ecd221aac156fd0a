use thiserror::Error;

use crate::audio::{Format, SampleType};
use crate::traits::EngineError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("format mismatch: expected {expected}, got {actual}")]
    FormatMismatch { expected: Format, actual: Format },

    #[error("sample type mismatch: data holds {expected} samples, {requested} was requested")]
    SampleTypeMismatch {
        expected: SampleType,
        requested: SampleType,
    },

    #[error("{len} is not a whole number of {frame_size}-sized frames")]
    PartialFrame { len: usize, frame_size: usize },

    #[error("sample data is not aligned for {sample_type} access")]
    Misaligned { sample_type: SampleType },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("{operation} failed: {source}")]
    Engine {
        operation: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("invalid converter options: {0}")]
    Options(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn engine(operation: &'static str, source: EngineError) -> Self {
        Error::Engine { operation, source }
    }

    /// Engine error code, if this error came from the conversion engine.
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Error::Engine { source, .. } => Some(source.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
