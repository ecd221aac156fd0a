//! PCM formats, borrowed views and owned buffers.

pub mod buffer;
pub mod types;
pub mod view;

pub use buffer::Buffer;
pub use types::{Format, PcmSample, SampleType, S24};
pub use view::{View, ViewMut};
