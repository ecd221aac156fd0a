use log::{debug, trace};
use rubato::{
    FastFixedIn, PolynomialDegree, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::audio::Format;
use crate::converter::{ConverterOptions, ResamplerQuality, SincInterpolation, SincWindow};
use crate::traits::{ConversionEngine, EngineError};
use crate::utils::sample_ops::{convert_interleaved, decode_planar, encode_planar};

enum Backend {
    Sinc(SincFixedIn<f32>),
    Fast(FastFixedIn<f32>),
}

impl Backend {
    /// Whether the chunk size can shrink below the one set at construction.
    /// The polynomial resampler only takes whole chunks.
    fn resizable_chunks(&self) -> bool {
        match self {
            Backend::Sinc(_) => true,
            Backend::Fast(_) => false,
        }
    }
}

// Runs `$body` against whichever resampler the backend holds.
macro_rules! with_resampler {
    ($backend:expr, $resampler:ident => $body:expr) => {
        match $backend {
            Backend::Sinc($resampler) => $body,
            Backend::Fast($resampler) => $body,
        }
    };
}

struct ResampleStage {
    backend: Backend,
    chunk_frames: usize,
    max_output_per_chunk: usize,
    planar_in: Vec<Vec<f32>>,
    planar_out: Vec<Vec<f32>>,
}

enum Stage {
    /// Equal rates: sample type and channel conversion only.
    Direct,
    Resample(ResampleStage),
}

/// Conversion engine built on `rubato` fixed-input resamplers.
///
/// Input frames are decoded to planar `f32`, mapped to the output channel
/// count, resampled when the rates differ, and encoded to the output sample
/// type.
pub struct RubatoEngine {
    input: Format,
    output: Format,
    max_chunk_frames: usize,
    stage: Stage,
}

impl RubatoEngine {
    pub const INVALID_ARGS: i32 = -2;
    pub const RESAMPLER_INIT: i32 = -10;
    pub const RESAMPLE: i32 = -11;
    pub const BUFFER_SIZE: i32 = -12;

    /// Ratio of output rate to input rate.
    pub fn ratio(&self) -> f64 {
        self.output.rate() as f64 / self.input.rate() as f64
    }

    pub fn is_resampling(&self) -> bool {
        matches!(self.stage, Stage::Resample(_))
    }

    fn build_backend(options: &ConverterOptions, ratio: f64) -> Result<Backend, EngineError> {
        let config = &options.resampler;
        let channels = options.output.channels() as usize;
        let chunk = config.max_chunk_frames;

        let backend = match config.quality {
            ResamplerQuality::Sinc => {
                let params = SincInterpolationParameters {
                    sinc_len: config.sinc_len,
                    f_cutoff: config.f_cutoff,
                    interpolation: match config.interpolation {
                        SincInterpolation::Nearest => SincInterpolationType::Nearest,
                        SincInterpolation::Linear => SincInterpolationType::Linear,
                        SincInterpolation::Quadratic => SincInterpolationType::Quadratic,
                        SincInterpolation::Cubic => SincInterpolationType::Cubic,
                    },
                    oversampling_factor: config.oversampling_factor,
                    window: match config.window {
                        SincWindow::Blackman => WindowFunction::Blackman,
                        SincWindow::Blackman2 => WindowFunction::Blackman2,
                        SincWindow::BlackmanHarris => WindowFunction::BlackmanHarris,
                        SincWindow::BlackmanHarris2 => WindowFunction::BlackmanHarris2,
                        SincWindow::Hann => WindowFunction::Hann,
                        SincWindow::Hann2 => WindowFunction::Hann2,
                    },
                };
                SincFixedIn::<f32>::new(ratio, 1.0, params, chunk, channels).map(Backend::Sinc)
            }
            ResamplerQuality::Fast => {
                FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, chunk, channels)
                    .map(Backend::Fast)
            }
        };

        backend.map_err(|e| {
            EngineError::new(
                Self::RESAMPLER_INIT,
                format!("resampler creation error: {}", e),
            )
        })
    }
}

impl ResampleStage {
    fn set_chunk_frames(&mut self, frames: usize) -> Result<(), EngineError> {
        if frames == self.chunk_frames {
            return Ok(());
        }
        with_resampler!(&mut self.backend, r => r.set_chunk_size(frames)).map_err(|e| {
            EngineError::new(RubatoEngine::RESAMPLE, format!("chunk size error: {}", e))
        })?;
        self.chunk_frames = frames;
        Ok(())
    }

    /// Resamples chunks until the input runs out or the next chunk's output
    /// would not fit. A short tail is only taken when the backend can shrink
    /// its chunk; otherwise it is left unconsumed. Returns
    /// `(consumed, produced)` frames.
    fn run(
        &mut self,
        input_format: &Format,
        output_format: &Format,
        input: &[u8],
        output: &mut [u8],
        max_chunk_frames: usize,
    ) -> Result<(usize, usize), EngineError> {
        let in_size = input_format.frame_size();
        let out_size = output_format.frame_size();
        let available = input.len() / in_size;
        let capacity = output.len() / out_size;

        let mut consumed = 0;
        let mut produced = 0;
        while consumed < available {
            let chunk = (available - consumed).min(max_chunk_frames);
            if chunk < max_chunk_frames && !self.backend.resizable_chunks() {
                trace!("holding {} frames until a whole chunk arrives", chunk);
                break;
            }
            self.set_chunk_frames(chunk)?;

            let next_output = with_resampler!(&self.backend, r => r.output_frames_next());
            if capacity - produced < next_output {
                trace!(
                    "output full: {} frames left, next chunk needs {}",
                    capacity - produced,
                    next_output
                );
                break;
            }

            let bytes = &input[consumed * in_size..(consumed + chunk) * in_size];
            decode_planar(input_format, bytes, &mut self.planar_in);

            let (read, written) = with_resampler!(
                &mut self.backend,
                r => r.process_into_buffer(&self.planar_in, &mut self.planar_out, None)
            )
            .map_err(|e| {
                EngineError::new(RubatoEngine::RESAMPLE, format!("resampling error: {}", e))
            })?;

            encode_planar(
                output_format,
                &self.planar_out,
                written,
                &mut output[produced * out_size..],
            );
            consumed += read;
            produced += written;

            if read == 0 {
                break;
            }
        }
        Ok((consumed, produced))
    }
}

impl ConversionEngine for RubatoEngine {
    fn init(options: &ConverterOptions) -> Result<Self, EngineError> {
        options
            .resampler
            .validate()
            .map_err(|msg| EngineError::new(Self::INVALID_ARGS, msg))?;
        let max_chunk_frames = options.resampler.max_chunk_frames;

        let input = options.input;
        let output = options.output;
        let stage = if input.rate() == output.rate() {
            Stage::Direct
        } else {
            let ratio = output.rate() as f64 / input.rate() as f64;
            let backend = Self::build_backend(options, ratio)?;
            let planar_out = with_resampler!(&backend, r => r.output_buffer_allocate(true));
            let max_output_per_chunk = with_resampler!(&backend, r => r.output_frames_max());
            Stage::Resample(ResampleStage {
                backend,
                chunk_frames: max_chunk_frames,
                max_output_per_chunk,
                planar_in: vec![vec![0.0; max_chunk_frames]; output.channels() as usize],
                planar_out,
            })
        };

        debug!(
            "rubato engine: {} -> {} ({:?}, resampling: {})",
            input,
            output,
            options.resampler.quality,
            matches!(stage, Stage::Resample(_))
        );

        Ok(Self {
            input,
            output,
            max_chunk_frames,
            stage,
        })
    }

    fn expected_output_count(&self, input_frames: usize) -> Result<usize, EngineError> {
        match &self.stage {
            Stage::Direct => Ok(input_frames),
            Stage::Resample(stage) => {
                let chunks = if stage.backend.resizable_chunks() {
                    input_frames.div_ceil(self.max_chunk_frames)
                } else {
                    input_frames / self.max_chunk_frames
                };
                Ok(chunks * stage.max_output_per_chunk)
            }
        }
    }

    fn process(
        &mut self,
        input: &[u8],
        input_frames: &mut usize,
        output: &mut [u8],
        output_frames: &mut usize,
    ) -> Result<(), EngineError> {
        let in_bytes = *input_frames * self.input.frame_size();
        let out_bytes = *output_frames * self.output.frame_size();
        if input.len() < in_bytes || output.len() < out_bytes {
            return Err(EngineError::new(
                Self::BUFFER_SIZE,
                format!(
                    "buffers hold {} input and {} output bytes, {} and {} were claimed",
                    input.len(),
                    output.len(),
                    in_bytes,
                    out_bytes
                ),
            ));
        }
        let input = &input[..in_bytes];
        let output = &mut output[..out_bytes];

        let (consumed, produced) = match &mut self.stage {
            Stage::Direct => {
                let frames = convert_interleaved(&self.input, input, &self.output, output);
                (frames, frames)
            }
            Stage::Resample(stage) => {
                stage.run(&self.input, &self.output, input, output, self.max_chunk_frames)?
            }
        };

        *input_frames = consumed;
        *output_frames = produced;
        Ok(())
    }

    fn reset(&mut self) {
        if let Stage::Resample(stage) = &mut self.stage {
            with_resampler!(&mut stage.backend, r => r.reset());
        }
    }

    fn destroy(&mut self) {
        // Drops the resampler and its scratch buffers.
        self.stage = Stage::Direct;
        debug!("rubato engine released: {} -> {}", self.input, self.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Buffer, SampleType};
    use crate::converter::ResamplerConfig;

    fn run_once(engine: &mut RubatoEngine, input: &Buffer, output_format: Format) -> (usize, Buffer) {
        let expected = engine.expected_output_count(input.size()).unwrap();
        let mut output = Buffer::zeroed(output_format, expected);
        let mut consumed = input.size();
        let mut produced = expected;
        engine
            .process(input.as_bytes(), &mut consumed, output.as_bytes_mut(), &mut produced)
            .unwrap();
        assert!(produced <= expected);
        output.truncate(produced);
        (consumed, output)
    }

    #[test]
    fn test_direct_conversion_when_rates_match() {
        let input = Format::stereo(48_000, SampleType::S16);
        let output = Format::mono(48_000, SampleType::F32);
        let mut engine = RubatoEngine::init(&ConverterOptions::new(input, output)).unwrap();
        assert!(!engine.is_resampling());

        let buffer = Buffer::from_samples(2, 48_000, &[16_384i16, 0, -16_384, -16_384]).unwrap();
        let (consumed, converted) = run_once(&mut engine, &buffer, output);
        assert_eq!(consumed, 2);
        assert_eq!(converted.samples::<f32>().unwrap(), &[0.25, -0.5]);
    }

    #[test]
    fn test_rejects_zero_chunk() {
        let mut options = ConverterOptions::new(
            Format::mono(44_100, SampleType::S16),
            Format::mono(48_000, SampleType::S16),
        );
        options.resampler.max_chunk_frames = 0;
        let err = RubatoEngine::init(&options).err().unwrap();
        assert_eq!(err.code, RubatoEngine::INVALID_ARGS);
    }

    #[test]
    fn test_expected_count_bounds_output() {
        for quality in [ResamplerQuality::Sinc, ResamplerQuality::Fast] {
            let input = Format::mono(44_100, SampleType::F32);
            let output = Format::mono(48_000, SampleType::F32);
            let options = ConverterOptions::new(input, output).with_resampler(ResamplerConfig {
                quality,
                max_chunk_frames: 256,
                ..ResamplerConfig::default()
            });
            let mut engine = RubatoEngine::init(&options).unwrap();
            assert!(engine.is_resampling());
            assert_eq!(engine.expected_output_count(0).unwrap(), 0);

            // Several chunks plus a short tail, which only sinc can take.
            let buffer = Buffer::zeroed(input, 700);
            let (consumed, converted) = run_once(&mut engine, &buffer, output);
            let whole = match quality {
                ResamplerQuality::Sinc => 700,
                ResamplerQuality::Fast => 512,
            };
            assert_eq!(consumed, whole);
            assert!(converted.size() > 0);
        }
    }

    #[test]
    fn test_resampled_stream_length_tracks_ratio() {
        let input = Format::mono(16_000, SampleType::S16);
        let output = Format::mono(48_000, SampleType::S16);
        let options = ConverterOptions::new(input, output).with_resampler(ResamplerConfig {
            quality: ResamplerQuality::Fast,
            max_chunk_frames: 160,
            ..ResamplerConfig::default()
        });
        let mut engine = RubatoEngine::init(&options).unwrap();

        let chunk = Buffer::zeroed(input, 160);
        let mut total = 0;
        for _ in 0..100 {
            let (consumed, converted) = run_once(&mut engine, &chunk, output);
            assert_eq!(consumed, 160);
            total += converted.size();
        }
        // 16000 frames in at 3x, less the resampler's start-up delay.
        assert!(total <= 48_000 + 10, "total {}", total);
        assert!(total >= 48_000 - 200, "total {}", total);
    }

    #[test]
    fn test_fast_backend_holds_partial_chunk() {
        let input = Format::mono(44_100, SampleType::S16);
        let output = Format::mono(48_000, SampleType::S16);
        let options = ConverterOptions::new(input, output).with_resampler(ResamplerConfig {
            quality: ResamplerQuality::Fast,
            max_chunk_frames: 128,
            ..ResamplerConfig::default()
        });
        let mut engine = RubatoEngine::init(&options).unwrap();
        assert_eq!(engine.expected_output_count(127).unwrap(), 0);

        let (consumed, converted) = run_once(&mut engine, &Buffer::zeroed(input, 100), output);
        assert_eq!((consumed, converted.size()), (0, 0));

        let (consumed, converted) = run_once(&mut engine, &Buffer::zeroed(input, 300), output);
        assert_eq!(consumed, 256);
        assert!(converted.size() > 0);
    }

    #[test]
    fn test_rejects_unusable_resampler_settings() {
        let broken = [
            ResamplerConfig {
                sinc_len: 0,
                ..ResamplerConfig::default()
            },
            ResamplerConfig {
                oversampling_factor: 0,
                ..ResamplerConfig::default()
            },
            ResamplerConfig {
                f_cutoff: 0.0,
                ..ResamplerConfig::default()
            },
            ResamplerConfig {
                f_cutoff: 1.5,
                ..ResamplerConfig::default()
            },
            ResamplerConfig {
                f_cutoff: f32::NAN,
                ..ResamplerConfig::default()
            },
            ResamplerConfig {
                max_chunk_frames: ResamplerConfig::MAX_CHUNK_FRAMES + 1,
                ..ResamplerConfig::default()
            },
        ];
        for config in broken {
            let options = ConverterOptions::new(
                Format::mono(44_100, SampleType::S16),
                Format::mono(48_000, SampleType::S16),
            )
            .with_resampler(config.clone());
            let err = RubatoEngine::init(&options).err();
            assert_eq!(
                err.map(|e| e.code),
                Some(RubatoEngine::INVALID_ARGS),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_destroy_releases_resampler() {
        let options = ConverterOptions::new(
            Format::mono(44_100, SampleType::F32),
            Format::mono(48_000, SampleType::F32),
        );
        let mut engine = RubatoEngine::init(&options).unwrap();
        assert!(engine.is_resampling());
        engine.destroy();
        assert!(!engine.is_resampling());
    }

    #[test]
    fn test_reports_short_buffers() {
        let format = Format::mono(8_000, SampleType::S16);
        let mut engine = RubatoEngine::init(&ConverterOptions::new(format, format)).unwrap();
        let input = [0u8; 4];
        let mut output = [0u8; 4];
        let mut consumed = 3;
        let mut produced = 2;
        let err = engine
            .process(&input, &mut consumed, &mut output, &mut produced)
            .unwrap_err();
        assert_eq!(err.code, RubatoEngine::BUFFER_SIZE);
    }

    #[test]
    fn test_output_capacity_limits_consumption() {
        let format = Format::mono(8_000, SampleType::U8);
        let mut engine = RubatoEngine::init(&ConverterOptions::new(format, format)).unwrap();
        let input = [1u8, 2, 3, 4, 5];
        let mut output = [0u8; 3];
        let mut consumed = 5;
        let mut produced = 3;
        engine
            .process(&input, &mut consumed, &mut output, &mut produced)
            .unwrap();
        assert_eq!((consumed, produced), (3, 3));
        assert_eq!(output, [1, 2, 3]);
    }
}
