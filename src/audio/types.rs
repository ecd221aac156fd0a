use std::fmt;
use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Encoding of a single PCM sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    U8,
    S16,
    /// 24-bit signed, stored sign-extended in a 32-bit container.
    S24,
    S32,
    F32,
}

impl SampleType {
    pub const ALL: [SampleType; 5] = [
        SampleType::U8,
        SampleType::S16,
        SampleType::S24,
        SampleType::S32,
        SampleType::F32,
    ];

    /// Size of one sample in bytes.
    pub const fn byte_width(self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::S16 => 2,
            SampleType::S24 | SampleType::S32 | SampleType::F32 => 4,
        }
    }

    /// Number of significant bits in one sample.
    pub const fn bits(self) -> u32 {
        match self {
            SampleType::U8 => 8,
            SampleType::S16 => 16,
            SampleType::S24 => 24,
            SampleType::S32 | SampleType::F32 => 32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SampleType::U8 => "u8",
            SampleType::S16 => "s16",
            SampleType::S24 => "s24",
            SampleType::S32 => "s32",
            SampleType::F32 => "f32",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SampleType::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 24-bit signed sample held in the low bits of an `i32`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct S24(pub i32);

impl S24 {
    pub const MIN: i32 = -(1 << 23);
    pub const MAX: i32 = (1 << 23) - 1;

    /// Wraps `value`, saturating it into the 24-bit range.
    pub fn saturating(value: i32) -> Self {
        S24(value.clamp(Self::MIN, Self::MAX))
    }

    /// The sample value, sign-extended from bit 23.
    pub fn get(self) -> i32 {
        (self.0 << 8) >> 8
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for super::S24 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
}

/// Native element type for one [`SampleType`].
///
/// Implemented for exactly the five supported encodings, so typed views can
/// only ever be built over a supported element type.
pub trait PcmSample: Pod + sealed::Sealed {
    const TYPE: SampleType;
}

impl PcmSample for u8 {
    const TYPE: SampleType = SampleType::U8;
}

impl PcmSample for i16 {
    const TYPE: SampleType = SampleType::S16;
}

impl PcmSample for S24 {
    const TYPE: SampleType = SampleType::S24;
}

impl PcmSample for i32 {
    const TYPE: SampleType = SampleType::S32;
}

impl PcmSample for f32 {
    const TYPE: SampleType = SampleType::F32;
}

/// Channel count, sample rate and sample type of a PCM stream.
///
/// `channels` and `rate` are never zero, so `frame_size()` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFormat")]
pub struct Format {
    channels: u16,
    rate: u32,
    sample_type: SampleType,
}

#[derive(Deserialize)]
struct RawFormat {
    channels: u16,
    rate: u32,
    sample_type: SampleType,
}

impl TryFrom<RawFormat> for Format {
    type Error = Error;

    fn try_from(raw: RawFormat) -> Result<Self> {
        Format::try_new(raw.channels, raw.rate, raw.sample_type)
    }
}

impl Format {
    /// # Panics
    ///
    /// Panics if `channels` or `rate` is zero.
    pub const fn new(channels: u16, rate: u32, sample_type: SampleType) -> Self {
        assert!(channels > 0, "format needs at least one channel");
        assert!(rate > 0, "format needs a non-zero sample rate");
        Self {
            channels,
            rate,
            sample_type,
        }
    }

    pub fn try_new(channels: u16, rate: u32, sample_type: SampleType) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidFormat("channel count must be at least 1".into()));
        }
        if rate == 0 {
            return Err(Error::InvalidFormat("sample rate must be non-zero".into()));
        }
        Ok(Self::new(channels, rate, sample_type))
    }

    pub const fn mono(rate: u32, sample_type: SampleType) -> Self {
        Self::new(1, rate, sample_type)
    }

    pub const fn stereo(rate: u32, sample_type: SampleType) -> Self {
        Self::new(2, rate, sample_type)
    }

    pub const fn channels(&self) -> u16 {
        self.channels
    }

    pub const fn rate(&self) -> u32 {
        self.rate
    }

    pub const fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Size of one frame (one sample per channel) in bytes.
    pub const fn frame_size(&self) -> usize {
        self.channels as usize * self.sample_type.byte_width()
    }

    /// Whole frames covering `duration`, rounded down.
    pub fn frames_for(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.rate as f64) as usize
    }

    pub fn duration_of(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.rate as f64)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ch/{}Hz/{}", self.channels, self.rate, self.sample_type)
    }
}
