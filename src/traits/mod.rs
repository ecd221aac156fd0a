use thiserror::Error;

use crate::converter::ConverterOptions;

/// Failure reported by a [`ConversionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    /// Engine-specific error code.
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// An engine that converts interleaved frames of one format into another.
///
/// A [`Converter`](crate::Converter) drives the engine with the bytes of its
/// carry-over buffer. The engine may consume fewer frames than it is offered;
/// whatever it leaves is offered again, ahead of new input, on the next call.
pub trait ConversionEngine {
    fn init(options: &ConverterOptions) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Upper bound on the output frames `input_frames` frames of input would
    /// produce right now.
    fn expected_output_count(&self, input_frames: usize) -> Result<usize, EngineError>;

    /// Converts frames from `input` into `output`.
    ///
    /// On entry `input_frames` and `output_frames` hold the frames available in
    /// `input` and the room in `output`. On success they are refined in place
    /// to the frames actually consumed and produced.
    fn process(
        &mut self,
        input: &[u8],
        input_frames: &mut usize,
        output: &mut [u8],
        output_frames: &mut usize,
    ) -> Result<(), EngineError>;

    /// Drops any filter history so the next call starts a fresh stream.
    fn reset(&mut self) {}

    /// Releases engine resources. Called exactly once, by [`EngineHandle`].
    ///
    /// [`EngineHandle`]: crate::engine::EngineHandle
    fn destroy(&mut self) {}
}
