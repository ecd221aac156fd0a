//! Typed PCM buffers and streaming sample format conversion.
//!
//! [`Buffer`] owns interleaved frames of a fixed [`Format`]; [`View`] and
//! [`ViewMut`] borrow them. A [`Converter`] turns a stream of views in one
//! format into buffers of another, keeping whatever input its
//! [`ConversionEngine`] leaves unconsumed for the next call.

pub mod audio;
pub mod converter;
pub mod engine;
pub mod error;
pub mod traits;
pub mod utils;

pub use audio::{Buffer, Format, PcmSample, SampleType, View, ViewMut, S24};
pub use converter::{
    Converter, ConverterOptions, ConverterStats, ResamplerConfig, ResamplerQuality,
    SincInterpolation, SincWindow,
};
pub use engine::{EngineHandle, RubatoEngine};
pub use error::{Error, Result};
pub use traits::{ConversionEngine, EngineError};
