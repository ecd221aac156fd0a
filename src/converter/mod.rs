//! Streaming format conversion with carry-over of unconsumed input.

mod options;

pub use options::{
    ConverterOptions, ResamplerConfig, ResamplerQuality, SincInterpolation, SincWindow,
};

use log::{debug, trace};

use crate::audio::{Buffer, Format, View};
use crate::engine::{EngineHandle, RubatoEngine};
use crate::error::{Error, Result};
use crate::traits::{ConversionEngine, EngineError};

/// Running totals across every `process` call since construction or the last
/// [`Converter::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConverterStats {
    /// Frames accepted by `process`, including calls the engine then failed.
    /// Always equals `frames_consumed` plus the pending frames.
    pub frames_in: u64,
    /// Frames the engine actually consumed.
    pub frames_consumed: u64,
    pub frames_produced: u64,
    pub calls: u64,
}

/// Converts a stream of interleaved PCM chunks from one [`Format`] to another.
///
/// Input the engine does not consume in one call is kept and offered again,
/// ahead of the next chunk, so no frame is dropped or duplicated.
pub struct Converter<E: ConversionEngine = RubatoEngine> {
    input: Format,
    output: Format,
    engine: EngineHandle<E>,
    carry: Buffer,
    stats: ConverterStats,
}

impl Converter<RubatoEngine> {
    pub fn new(options: ConverterOptions) -> Result<Self> {
        Self::with_engine(options)
    }
}

impl<E: ConversionEngine> Converter<E> {
    /// Creates a converter driven by engine `E`.
    pub fn with_engine(options: ConverterOptions) -> Result<Self> {
        let engine = EngineHandle::<E>::init(&options).map_err(|e| Error::engine("init", e))?;
        debug!("converter ready: {} -> {}", options.input, options.output);

        Ok(Self {
            input: options.input,
            output: options.output,
            engine,
            carry: Buffer::new(options.input),
            stats: ConverterStats::default(),
        })
    }

    pub fn input_format(&self) -> Format {
        self.input
    }

    pub fn output_format(&self) -> Format {
        self.output
    }

    /// Input frames accepted but not yet consumed by the engine.
    pub fn pending(&self) -> View<'_> {
        self.carry.view()
    }

    pub fn pending_frames(&self) -> usize {
        self.carry.size()
    }

    pub fn stats(&self) -> ConverterStats {
        self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Converts `input`, together with any carried-over frames, into a new
    /// buffer in the output format.
    ///
    /// The result may be shorter or longer than the input; an empty result is
    /// not an error. Frames the engine leaves unconsumed are kept for the next
    /// call.
    pub fn process(&mut self, input: View<'_>) -> Result<Buffer> {
        if input.format() != self.input {
            return Err(Error::FormatMismatch {
                expected: self.input,
                actual: input.format(),
            });
        }
        if input.is_empty() {
            return Ok(Buffer::new(self.output));
        }

        self.carry.append(input)?;
        self.stats.frames_in += input.size() as u64;
        let available = self.carry.size();

        let expected = self
            .engine
            .expected_output_count(available)
            .map_err(|e| Error::engine("expected_output_count", e))?;
        let mut output = Buffer::zeroed(self.output, expected);

        let mut consumed = available;
        let mut produced = expected;
        self.engine
            .process(
                self.carry.as_bytes(),
                &mut consumed,
                output.as_bytes_mut(),
                &mut produced,
            )
            .map_err(|e| Error::engine("process", e))?;

        if consumed > available || produced > expected {
            return Err(Error::engine(
                "process",
                EngineError::new(
                    -1,
                    format!(
                        "engine reported {}/{} frames consumed and {}/{} produced",
                        consumed, available, produced, expected
                    ),
                ),
            ));
        }

        if consumed > 0 {
            self.carry = Buffer::from_view(self.carry.tail(consumed));
        }
        output.truncate(produced);

        self.stats.frames_consumed += consumed as u64;
        self.stats.frames_produced += produced as u64;
        self.stats.calls += 1;

        trace!(
            "process: {} in, {} consumed, {} produced, {} pending",
            input.size(),
            consumed,
            produced,
            self.carry.size()
        );
        Ok(output)
    }

    /// Drops pending input, clears engine filter state and zeroes the stats.
    pub fn reset(&mut self) {
        self.carry.clear();
        self.engine.reset();
        self.stats = ConverterStats::default();
        debug!("converter reset: {} -> {}", self.input, self.output);
    }
}
