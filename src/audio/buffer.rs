use std::fmt;

use crate::audio::types::{Format, PcmSample};
use crate::audio::view::{cast_samples, cast_samples_mut, clamp_range, View, ViewMut};
use crate::error::{Error, Result};

// Storage words keep every buffer aligned for the widest sample type.
type Word = u32;
const WORD_SIZE: usize = std::mem::size_of::<Word>();

/// Owned, growable sequence of interleaved PCM frames.
///
/// The stored byte length is always a whole number of frames.
#[derive(Clone)]
pub struct Buffer {
    format: Format,
    words: Vec<Word>,
    len: usize,
}

impl Buffer {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            words: Vec::new(),
            len: 0,
        }
    }

    /// Buffer holding `frames` frames of silence-valued zero bytes.
    pub fn zeroed(format: Format, frames: usize) -> Self {
        let len = frames * format.frame_size();
        Self {
            format,
            words: vec![0; len.div_ceil(WORD_SIZE)],
            len,
        }
    }

    /// Empty buffer with room for `frames` frames.
    pub fn with_capacity(format: Format, frames: usize) -> Self {
        let bytes = frames * format.frame_size();
        Self {
            format,
            words: Vec::with_capacity(bytes.div_ceil(WORD_SIZE)),
            len: 0,
        }
    }

    /// Copies the frames of `view` into a new buffer of the same format.
    pub fn from_view(view: View<'_>) -> Self {
        let mut buffer = Self::with_capacity(view.format(), view.size());
        buffer.push_bytes(view.as_bytes());
        buffer
    }

    pub fn from_samples<T: PcmSample>(channels: u16, rate: u32, samples: &[T]) -> Result<Self> {
        View::from_samples(channels, rate, samples).map(Self::from_view)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn frame_size(&self) -> usize {
        self.format.frame_size()
    }

    /// Number of frames.
    pub fn size(&self) -> usize {
        self.len / self.frame_size()
    }

    pub fn size_bytes(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Word, u8>(&self.words)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut::<Word, u8>(&mut self.words)[..len]
    }

    pub fn samples<T: PcmSample>(&self) -> Result<&[T]> {
        cast_samples(&self.format, self.as_bytes())
    }

    pub fn samples_mut<T: PcmSample>(&mut self) -> Result<&mut [T]> {
        let format = self.format;
        cast_samples_mut(&format, self.as_bytes_mut())
    }

    pub fn view(&self) -> View<'_> {
        View::from_parts(self.format, self.as_bytes())
    }

    pub fn view_mut(&mut self) -> ViewMut<'_> {
        let format = self.format;
        ViewMut::from_parts(format, self.as_bytes_mut())
    }

    /// View of up to `count` frames starting at frame `pos`.
    ///
    /// Requests past the end are clamped to the frames that exist, so this
    /// never fails. The view borrows the buffer; it has to be dropped before
    /// the buffer can be appended to or erased from:
    ///
    /// ```compile_fail
    /// use pcm_stream::{Buffer, Format, SampleType};
    ///
    /// let mut buffer = Buffer::zeroed(Format::mono(8_000, SampleType::S16), 4);
    /// let head = buffer.span(0, 2);
    /// buffer.erase(0, 1);
    /// assert_eq!(head.size(), 2);
    /// ```
    pub fn span(&self, pos: usize, count: usize) -> View<'_> {
        self.view().slice(pos, count)
    }

    /// Every frame from `pos` to the end.
    pub fn tail(&self, pos: usize) -> View<'_> {
        self.span(pos, usize::MAX)
    }

    pub fn span_mut(&mut self, pos: usize, count: usize) -> ViewMut<'_> {
        let (pos, count) = clamp_range(self.size(), pos, count);
        let frame_size = self.frame_size();
        let format = self.format;
        let start = pos * frame_size;
        let bytes = &mut self.as_bytes_mut()[start..start + count * frame_size];
        ViewMut::from_parts(format, bytes)
    }

    /// Copies the frames of `view` onto the end of the buffer.
    ///
    /// Fails with [`Error::FormatMismatch`] unless `view` has exactly this
    /// buffer's format.
    pub fn append(&mut self, view: View<'_>) -> Result<()> {
        if view.format() != self.format {
            return Err(Error::FormatMismatch {
                expected: self.format,
                actual: view.format(),
            });
        }
        self.push_bytes(view.as_bytes());
        Ok(())
    }

    /// Appends a copy of up to `count` of this buffer's own frames starting
    /// at `pos`, clamped like [`span`](Self::span). Returns the number of
    /// frames copied.
    pub fn extend_from_within(&mut self, pos: usize, count: usize) -> usize {
        let (pos, count) = clamp_range(self.size(), pos, count);
        let frame_size = self.frame_size();
        let start = pos * frame_size;
        let end = start + count * frame_size;
        let old_len = self.len;

        self.resize_bytes(old_len + count * frame_size);
        self.as_bytes_mut().copy_within(start..end, old_len);
        count
    }

    /// Removes up to `count` frames starting at frame `pos`, shifting the
    /// frames after them down. Clamped like [`span`](Self::span); returns the
    /// number of frames removed.
    pub fn erase(&mut self, pos: usize, count: usize) -> usize {
        let (pos, count) = clamp_range(self.size(), pos, count);
        if count == 0 {
            return 0;
        }
        let frame_size = self.frame_size();
        let start = pos * frame_size;
        let end = start + count * frame_size;
        let len = self.len;

        self.as_bytes_mut().copy_within(end..len, start);
        self.resize_bytes(len - (end - start));
        count
    }

    /// Shortens the buffer to `frames` frames; no-op if it is already shorter.
    pub fn truncate(&mut self, frames: usize) {
        if frames < self.size() {
            self.resize_bytes(frames * self.frame_size());
        }
    }

    pub fn clear(&mut self) {
        self.resize_bytes(0);
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        let old_len = self.len;
        self.resize_bytes(old_len + bytes.len());
        self.as_bytes_mut()[old_len..].copy_from_slice(bytes);
    }

    fn resize_bytes(&mut self, len: usize) {
        self.words.resize(len.div_ceil(WORD_SIZE), 0);
        self.len = len;
        // Keep the slack after the last frame zeroed.
        bytemuck::cast_slice_mut::<Word, u8>(&mut self.words)[len..].fill(0);
    }
}

impl<'a> From<View<'a>> for Buffer {
    fn from(view: View<'a>) -> Self {
        Self::from_view(view)
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("format", &self.format)
            .field("frames", &self.size())
            .finish()
    }
}
