use serde::{Deserialize, Serialize};

use crate::audio::Format;
use crate::error::Result;

/// Resampler algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerQuality {
    /// Windowed sinc interpolation.
    #[default]
    Sinc,
    /// Cubic polynomial interpolation, no anti-aliasing filter.
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SincInterpolation {
    Nearest,
    #[default]
    Linear,
    Quadratic,
    Cubic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SincWindow {
    Blackman,
    Blackman2,
    BlackmanHarris,
    #[default]
    BlackmanHarris2,
    Hann,
    Hann2,
}

/// Settings for the sample-rate conversion stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    pub quality: ResamplerQuality,
    pub sinc_len: usize,
    pub f_cutoff: f32,
    pub oversampling_factor: usize,
    pub interpolation: SincInterpolation,
    pub window: SincWindow,
    /// Largest input chunk handed to the resampler in one step.
    pub max_chunk_frames: usize,
}

impl ResamplerConfig {
    /// Upper limit on `max_chunk_frames`.
    pub const MAX_CHUNK_FRAMES: usize = 1 << 16;

    /// Checks that a resampler can be built from these settings.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_chunk_frames == 0 || self.max_chunk_frames > Self::MAX_CHUNK_FRAMES {
            return Err(format!(
                "max_chunk_frames must be in 1..={}, got {}",
                Self::MAX_CHUNK_FRAMES,
                self.max_chunk_frames
            ));
        }
        if self.sinc_len == 0 {
            return Err("sinc_len must be at least 1".into());
        }
        if self.oversampling_factor == 0 {
            return Err("oversampling_factor must be at least 1".into());
        }
        if !(self.f_cutoff > 0.0 && self.f_cutoff <= 1.0) {
            return Err(format!("f_cutoff must be in (0, 1], got {}", self.f_cutoff));
        }
        Ok(())
    }
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            quality: ResamplerQuality::Sinc,
            sinc_len: 256,
            f_cutoff: 0.95,
            oversampling_factor: 256,
            interpolation: SincInterpolation::Linear,
            window: SincWindow::BlackmanHarris2,
            max_chunk_frames: 1024,
        }
    }
}

/// Input and output formats of a converter plus engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterOptions {
    pub input: Format,
    pub output: Format,
    #[serde(default)]
    pub resampler: ResamplerConfig,
}

impl ConverterOptions {
    pub fn new(input: Format, output: Format) -> Self {
        Self {
            input,
            output,
            resampler: ResamplerConfig::default(),
        }
    }

    pub fn with_resampler(mut self, resampler: ResamplerConfig) -> Self {
        self.resampler = resampler;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
