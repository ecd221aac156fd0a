use dasp_sample::{Sample, I24};

use crate::audio::{Format, SampleType, S24};

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Reads the sample at the front of `bytes` as a float in `[-1.0, 1.0)`.
pub fn read_sample(sample_type: SampleType, bytes: &[u8]) -> f32 {
    match sample_type {
        SampleType::U8 => bytes[0].to_sample::<f32>(),
        SampleType::S16 => i16::from_ne_bytes([bytes[0], bytes[1]]).to_sample::<f32>(),
        SampleType::S24 => {
            let value = S24(i32::from_ne_bytes(word(bytes))).get();
            I24::new_unchecked(value).to_sample::<f32>()
        }
        SampleType::S32 => i32::from_ne_bytes(word(bytes)).to_sample::<f32>(),
        SampleType::F32 => f32::from_ne_bytes(word(bytes)),
    }
}

/// Writes `value` to the front of `out`, clipping it to the legal range.
pub fn write_sample(sample_type: SampleType, value: f32, out: &mut [u8]) {
    let value = value.clamp(-1.0, 1.0);
    match sample_type {
        SampleType::U8 => out[0] = value.to_sample::<u8>(),
        SampleType::S16 => out[..2].copy_from_slice(&value.to_sample::<i16>().to_ne_bytes()),
        SampleType::S24 => {
            let value = S24::saturating(value.to_sample::<I24>().inner());
            out[..4].copy_from_slice(&value.0.to_ne_bytes());
        }
        SampleType::S32 => out[..4].copy_from_slice(&value.to_sample::<i32>().to_ne_bytes()),
        SampleType::F32 => out[..4].copy_from_slice(&value.to_ne_bytes()),
    }
}

/// Maps one frame onto a different channel count.
///
/// Mono input is copied to every output channel and mono output is the mean
/// of all input channels. Other layouts keep the channels they share and
/// silence the rest.
pub fn map_channels(input: &[f32], output: &mut [f32]) {
    match (input.len(), output.len()) {
        (from, to) if from == to => output.copy_from_slice(input),
        (1, _) => output.fill(input[0]),
        (from, 1) => output[0] = input.iter().sum::<f32>() / from as f32,
        (from, to) => {
            let shared = from.min(to);
            output[..shared].copy_from_slice(&input[..shared]);
            output[shared..].fill(0.0);
        }
    }
}

/// Decodes interleaved frames of `format` into planar channels.
///
/// Frames are mapped onto `planar.len()` channels; frame `i` lands at index
/// `i` of each channel. Returns the number of frames decoded.
pub fn decode_planar<V: AsMut<[f32]>>(format: &Format, bytes: &[u8], planar: &mut [V]) -> usize {
    let sample_type = format.sample_type();
    let width = sample_type.byte_width();
    let mut frame = vec![0.0; format.channels() as usize];
    let mut mapped = vec![0.0; planar.len()];

    let mut frames = 0;
    for (i, raw) in bytes.chunks_exact(format.frame_size()).enumerate() {
        for (sample, raw) in frame.iter_mut().zip(raw.chunks_exact(width)) {
            *sample = read_sample(sample_type, raw);
        }
        map_channels(&frame, &mut mapped);
        for (channel, &value) in planar.iter_mut().zip(&mapped) {
            channel.as_mut()[i] = value;
        }
        frames += 1;
    }
    frames
}

/// Encodes the first `frames` frames of planar channels into interleaved
/// frames of `format`. `planar` must hold one channel per format channel.
pub fn encode_planar<V: AsRef<[f32]>>(format: &Format, planar: &[V], frames: usize, out: &mut [u8]) {
    debug_assert_eq!(planar.len(), format.channels() as usize);
    let sample_type = format.sample_type();
    let width = sample_type.byte_width();

    for (i, raw) in out.chunks_exact_mut(format.frame_size()).take(frames).enumerate() {
        for (channel, raw) in planar.iter().zip(raw.chunks_exact_mut(width)) {
            write_sample(sample_type, channel.as_ref()[i], raw);
        }
    }
}

/// Converts interleaved frames between formats without touching the rate.
///
/// Converts as many frames as both sides hold and returns that count.
pub fn convert_interleaved(input: &Format, from: &[u8], output: &Format, to: &mut [u8]) -> usize {
    let in_type = input.sample_type();
    let out_type = output.sample_type();
    let mut frame = vec![0.0; input.channels() as usize];
    let mut mapped = vec![0.0; output.channels() as usize];

    let mut frames = 0;
    let pairs = from
        .chunks_exact(input.frame_size())
        .zip(to.chunks_exact_mut(output.frame_size()));
    for (src, dst) in pairs {
        for (sample, raw) in frame.iter_mut().zip(src.chunks_exact(in_type.byte_width())) {
            *sample = read_sample(in_type, raw);
        }
        map_channels(&frame, &mut mapped);
        for (&value, raw) in mapped.iter().zip(dst.chunks_exact_mut(out_type.byte_width())) {
            write_sample(out_type, value, raw);
        }
        frames += 1;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(sample_type: SampleType, value: f32) -> Vec<u8> {
        let mut out = vec![0u8; sample_type.byte_width()];
        write_sample(sample_type, value, &mut out);
        out
    }

    #[test]
    fn test_read_known_values() {
        assert_eq!(read_sample(SampleType::U8, &[128]), 0.0);
        assert_eq!(read_sample(SampleType::U8, &[0]), -1.0);
        assert_eq!(read_sample(SampleType::S16, &i16::MIN.to_ne_bytes()), -1.0);
        assert_eq!(read_sample(SampleType::S16, &16_384i16.to_ne_bytes()), 0.5);
        assert_eq!(read_sample(SampleType::S32, &i32::MIN.to_ne_bytes()), -1.0);
        assert_eq!(read_sample(SampleType::F32, &0.125f32.to_ne_bytes()), 0.125);
    }

    #[test]
    fn test_s24_reads_sign_extended() {
        let min = S24::MIN.to_ne_bytes();
        assert_eq!(read_sample(SampleType::S24, &min), -1.0);

        // Only the low 24 bits are significant.
        let raw = 0x00C0_0000i32.to_ne_bytes();
        assert_eq!(read_sample(SampleType::S24, &raw), -0.5);
    }

    #[test]
    fn test_write_clips() {
        assert_eq!(encoded(SampleType::S16, 2.0), i16::MAX.to_ne_bytes().to_vec());
        assert_eq!(read_sample(SampleType::S16, &encoded(SampleType::S16, -2.0)), -1.0);
        assert_eq!(encoded(SampleType::S24, 1.0), S24::MAX.to_ne_bytes().to_vec());
        assert_eq!(encoded(SampleType::U8, 0.0), vec![128]);
        assert_eq!(encoded(SampleType::F32, 1.5), 1.0f32.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_write_then_read_is_close() {
        for sample_type in SampleType::ALL {
            for value in [-1.0f32, -0.5, -0.1, 0.0, 0.25, 0.75] {
                let back = read_sample(sample_type, &encoded(sample_type, value));
                let tolerance = (2.0 / (1u64 << (sample_type.bits() - 1)) as f32).max(1e-6);
                assert!(
                    (back - value).abs() <= tolerance,
                    "{sample_type}: wrote {value}, read {back}"
                );
            }
        }
    }

    #[test]
    fn test_map_channels() {
        let mut stereo = [0.0; 2];
        map_channels(&[0.5], &mut stereo);
        assert_eq!(stereo, [0.5, 0.5]);

        let mut mono = [0.0; 1];
        map_channels(&[0.5, -0.25], &mut mono);
        assert_eq!(mono, [0.125]);

        let mut quad = [9.0; 4];
        map_channels(&[0.1, 0.2], &mut quad);
        assert_eq!(quad, [0.1, 0.2, 0.0, 0.0]);

        let mut pair = [0.0; 2];
        map_channels(&[0.1, 0.2, 0.3], &mut pair);
        assert_eq!(pair, [0.1, 0.2]);
    }

    #[test]
    fn test_decode_and_encode_planar() {
        let format = Format::stereo(8_000, SampleType::S16);
        let samples: [i16; 4] = [16_384, -16_384, 0, 8_192];
        let bytes: &[u8] = bytemuck::cast_slice(&samples);

        let mut planar = vec![vec![0.0f32; 2]; 2];
        assert_eq!(decode_planar(&format, bytes, &mut planar), 2);
        assert_eq!(planar, vec![vec![0.5, 0.0], vec![-0.5, 0.25]]);

        let mut out = vec![0u8; bytes.len()];
        encode_planar(&format, &planar, 2, &mut out);
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_convert_interleaved_mono_s16_to_stereo_f32() {
        let input = Format::mono(8_000, SampleType::S16);
        let output = Format::stereo(8_000, SampleType::F32);
        let samples: [i16; 3] = [0, 16_384, -32_768];

        let mut out = vec![0u8; 3 * output.frame_size()];
        let frames = convert_interleaved(&input, bytemuck::cast_slice(&samples), &output, &mut out);
        assert_eq!(frames, 3);

        let floats: Vec<f32> = out
            .chunks_exact(4)
            .map(|raw| f32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .collect();
        assert_eq!(floats, vec![0.0, 0.0, 0.5, 0.5, -1.0, -1.0]);
    }

    #[test]
    fn test_convert_interleaved_stops_at_shorter_side() {
        let format = Format::mono(8_000, SampleType::U8);
        let mut out = [0u8; 2];
        assert_eq!(convert_interleaved(&format, &[1, 2, 3, 4], &format, &mut out), 2);
        assert_eq!(out, [1, 2]);
    }
}
