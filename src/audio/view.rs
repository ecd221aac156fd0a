use std::fmt;
use std::slice::{ChunksExact, ChunksExactMut};

use crate::audio::types::{Format, PcmSample};
use crate::error::{Error, Result};

/// Clamps a `(pos, count)` frame request to a sequence of `size` frames.
pub(crate) fn clamp_range(size: usize, pos: usize, count: usize) -> (usize, usize) {
    let pos = pos.min(size);
    (pos, count.min(size - pos))
}

fn check_whole_frames(len: usize, frame_size: usize) -> Result<()> {
    if len % frame_size != 0 {
        return Err(Error::PartialFrame { len, frame_size });
    }
    Ok(())
}

fn check_sample_type<T: PcmSample>(format: &Format) -> Result<()> {
    if format.sample_type() != T::TYPE {
        return Err(Error::SampleTypeMismatch {
            expected: format.sample_type(),
            requested: T::TYPE,
        });
    }
    Ok(())
}

pub(crate) fn cast_samples<'a, T: PcmSample>(format: &Format, bytes: &'a [u8]) -> Result<&'a [T]> {
    check_sample_type::<T>(format)?;
    bytemuck::try_cast_slice(bytes).map_err(|_| Error::Misaligned {
        sample_type: T::TYPE,
    })
}

pub(crate) fn cast_samples_mut<'a, T: PcmSample>(
    format: &Format,
    bytes: &'a mut [u8],
) -> Result<&'a mut [T]> {
    check_sample_type::<T>(format)?;
    bytemuck::try_cast_slice_mut(bytes).map_err(|_| Error::Misaligned {
        sample_type: T::TYPE,
    })
}

/// Non-owning view of interleaved PCM frames.
///
/// A `View` borrows the memory it describes, so it can never outlive it, and a
/// view taken from a [`Buffer`](crate::Buffer) keeps that buffer from being
/// mutated until the view is gone.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct View<'a> {
    format: Format,
    bytes: &'a [u8],
}

impl<'a> View<'a> {
    /// Views `bytes` as frames of `format`.
    ///
    /// Fails with [`Error::PartialFrame`] unless `bytes` holds a whole number
    /// of frames.
    pub fn new(format: Format, bytes: &'a [u8]) -> Result<Self> {
        check_whole_frames(bytes.len(), format.frame_size())?;
        Ok(Self { format, bytes })
    }

    pub fn empty(format: Format) -> Self {
        Self { format, bytes: &[] }
    }

    /// Views `frames` frames of `format` starting at `data`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `frames * format.frame_size()` bytes
    /// for the whole of `'a`, and the memory must not be mutated while the view
    /// is alive.
    pub unsafe fn from_raw_parts(format: Format, data: *const u8, frames: usize) -> Self {
        let bytes = std::slice::from_raw_parts(data, frames * format.frame_size());
        Self { format, bytes }
    }

    /// Views interleaved `samples`; the sample type follows from `T`.
    pub fn from_samples<T: PcmSample>(channels: u16, rate: u32, samples: &'a [T]) -> Result<Self> {
        let format = Format::try_new(channels, rate, T::TYPE)?;
        check_whole_frames(samples.len(), channels as usize)?;
        Ok(Self {
            format,
            bytes: bytemuck::cast_slice(samples),
        })
    }

    pub(crate) fn from_parts(format: Format, bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len() % format.frame_size(), 0);
        Self { format, bytes }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn frame_size(&self) -> usize {
        self.format.frame_size()
    }

    /// Number of frames.
    pub fn size(&self) -> usize {
        self.bytes.len() / self.frame_size()
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Interleaved samples as `T`, which must match the view's sample type.
    pub fn samples<T: PcmSample>(&self) -> Result<&'a [T]> {
        cast_samples(&self.format, self.bytes)
    }

    /// Sub-view of up to `count` frames starting at frame `pos`.
    ///
    /// Out-of-range requests are clamped to the frames that exist.
    pub fn slice(&self, pos: usize, count: usize) -> View<'a> {
        let (pos, count) = clamp_range(self.size(), pos, count);
        let frame_size = self.frame_size();
        let start = pos * frame_size;
        Self::from_parts(self.format, &self.bytes[start..start + count * frame_size])
    }

    /// Iterates over the bytes of each frame.
    pub fn frames(&self) -> ChunksExact<'a, u8> {
        self.bytes.chunks_exact(self.frame_size())
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("format", &self.format)
            .field("frames", &self.size())
            .finish()
    }
}

/// Mutable counterpart of [`View`].
pub struct ViewMut<'a> {
    format: Format,
    bytes: &'a mut [u8],
}

impl<'a> ViewMut<'a> {
    pub fn new(format: Format, bytes: &'a mut [u8]) -> Result<Self> {
        check_whole_frames(bytes.len(), format.frame_size())?;
        Ok(Self { format, bytes })
    }

    /// # Safety
    ///
    /// `data` must be valid for reads and writes of
    /// `frames * format.frame_size()` bytes for the whole of `'a`, and nothing
    /// else may access that memory while the view is alive.
    pub unsafe fn from_raw_parts(format: Format, data: *mut u8, frames: usize) -> Self {
        let bytes = std::slice::from_raw_parts_mut(data, frames * format.frame_size());
        Self { format, bytes }
    }

    pub fn from_samples<T: PcmSample>(
        channels: u16,
        rate: u32,
        samples: &'a mut [T],
    ) -> Result<Self> {
        let format = Format::try_new(channels, rate, T::TYPE)?;
        check_whole_frames(samples.len(), channels as usize)?;
        Ok(Self {
            format,
            bytes: bytemuck::cast_slice_mut(samples),
        })
    }

    pub(crate) fn from_parts(format: Format, bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len() % format.frame_size(), 0);
        Self { format, bytes }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn frame_size(&self) -> usize {
        self.format.frame_size()
    }

    pub fn size(&self) -> usize {
        self.bytes.len() / self.frame_size()
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    pub fn samples<T: PcmSample>(&self) -> Result<&[T]> {
        cast_samples(&self.format, &*self.bytes)
    }

    pub fn samples_mut<T: PcmSample>(&mut self) -> Result<&mut [T]> {
        cast_samples_mut(&self.format, &mut *self.bytes)
    }

    pub fn frames_mut(&mut self) -> ChunksExactMut<'_, u8> {
        let frame_size = self.frame_size();
        self.bytes.chunks_exact_mut(frame_size)
    }

    /// Read-only view of the same frames.
    pub fn as_view(&self) -> View<'_> {
        View::from_parts(self.format, &*self.bytes)
    }

    pub fn into_view(self) -> View<'a> {
        View::from_parts(self.format, self.bytes)
    }
}

impl fmt::Debug for ViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewMut")
            .field("format", &self.format)
            .field("frames", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::{SampleType, S24};

    #[test]
    fn test_from_samples_tags_type() {
        let samples = [1i16, -1, 2, -2];
        let view = View::from_samples(2, 48_000, &samples).unwrap();
        assert_eq!(view.format(), Format::stereo(48_000, SampleType::S16));
        assert_eq!(view.size(), 2);
        assert_eq!(view.size_bytes(), 8);

        let wide = [S24(1), S24(2)];
        let view = View::from_samples(1, 48_000, &wide).unwrap();
        assert_eq!(view.format().sample_type(), SampleType::S24);
        assert_eq!(view.size_bytes(), 8);
    }

    #[test]
    fn test_from_samples_rejects_partial_frame() {
        let samples = [0.0f32; 3];
        assert!(matches!(
            View::from_samples(2, 48_000, &samples),
            Err(Error::PartialFrame {
                len: 3,
                frame_size: 2
            })
        ));
    }

    #[test]
    fn test_new_rejects_partial_frame() {
        let bytes = [0u8; 7];
        let format = Format::stereo(8_000, SampleType::S16);
        assert!(View::new(format, &bytes).is_err());
        assert_eq!(View::new(format, &bytes[..4]).unwrap().size(), 1);
    }

    #[test]
    fn test_typed_access_is_checked() {
        let samples = [0.25f32, -0.5];
        let view = View::from_samples(1, 48_000, &samples).unwrap();
        assert_eq!(view.samples::<f32>().unwrap(), &samples);
        assert!(matches!(
            view.samples::<i32>(),
            Err(Error::SampleTypeMismatch {
                expected: SampleType::F32,
                requested: SampleType::S32
            })
        ));
    }

    #[test]
    fn test_misaligned_typed_access() {
        let words = [0u32; 3];
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        let view = View::new(Format::mono(8_000, SampleType::F32), &bytes[2..10]).unwrap();
        assert!(matches!(
            view.samples::<f32>(),
            Err(Error::Misaligned {
                sample_type: SampleType::F32
            })
        ));
    }

    #[test]
    fn test_slice_clamps() {
        let samples: Vec<i16> = (0..10).collect();
        let view = View::from_samples(1, 8_000, &samples).unwrap();

        assert_eq!(view.slice(2, 3).samples::<i16>().unwrap(), &[2, 3, 4]);
        assert_eq!(view.slice(8, 100).samples::<i16>().unwrap(), &[8, 9]);
        assert!(view.slice(100, 1).is_empty());
        assert_eq!(view.slice(0, usize::MAX).size(), 10);
    }

    #[test]
    fn test_frames_iterator() {
        let samples = [1u8, 2, 3, 4, 5, 6];
        let view = View::from_samples(3, 8_000, &samples).unwrap();
        let frames: Vec<&[u8]> = view.frames().collect();
        assert_eq!(frames, vec![&[1u8, 2, 3][..], &[4, 5, 6][..]]);
    }

    #[test]
    fn test_view_mut_writes_through() {
        let mut samples = [0i32; 4];
        {
            let mut view = ViewMut::from_samples(2, 96_000, &mut samples).unwrap();
            view.samples_mut::<i32>().unwrap()[3] = 7;
            assert_eq!(view.as_view().size(), 2);
        }
        assert_eq!(samples, [0, 0, 0, 7]);
    }

    #[test]
    fn test_from_raw_parts() {
        let samples = [10i16, 20, 30, 40];
        let format = Format::mono(8_000, SampleType::S16);
        let view = unsafe { View::from_raw_parts(format, samples.as_ptr().cast(), 3) };
        assert_eq!(view.samples::<i16>().unwrap(), &[10, 20, 30]);
    }
}
