//! Converts a WAV file to another rate, channel count and sample type.
//!
//! Usage: `wav_convert <input.wav> <output.wav> <rate> [channels] [u8|s16|s24|s32|f32]`

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;

use pcm_stream::{Buffer, Converter, ConverterOptions, Format, SampleType, S24};

const CHUNK_FRAMES: usize = 1024;

fn read_wav(path: &Path) -> anyhow::Result<Buffer> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let (channels, rate) = (spec.channels, spec.sample_rate);

    let buffer = match (spec.bits_per_sample, spec.sample_format) {
        (8, SampleFormat::Int) => {
            // hound hands out 8-bit PCM as signed; WAV stores it offset by 128.
            let samples = reader
                .samples::<i8>()
                .map(|s| s.map(|s| (s as i16 + 128) as u8))
                .collect::<Result<Vec<_>, _>>()?;
            Buffer::from_samples(channels, rate, &samples)?
        }
        (16, SampleFormat::Int) => {
            let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
            Buffer::from_samples(channels, rate, &samples)?
        }
        (24, SampleFormat::Int) => {
            let samples = reader
                .samples::<i32>()
                .map(|s| s.map(S24::saturating))
                .collect::<Result<Vec<_>, _>>()?;
            Buffer::from_samples(channels, rate, &samples)?
        }
        (32, SampleFormat::Int) => {
            let samples = reader.samples::<i32>().collect::<Result<Vec<_>, _>>()?;
            Buffer::from_samples(channels, rate, &samples)?
        }
        (32, SampleFormat::Float) => {
            let samples = reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?;
            Buffer::from_samples(channels, rate, &samples)?
        }
        (bits, format) => bail!(
            "unsupported WAV format: bits_per_sample={} sample_format={:?}",
            bits,
            format
        ),
    };
    Ok(buffer)
}

fn wav_spec(format: Format) -> WavSpec {
    let sample_format = match format.sample_type() {
        SampleType::F32 => SampleFormat::Float,
        SampleType::U8 | SampleType::S16 | SampleType::S24 | SampleType::S32 => SampleFormat::Int,
    };
    WavSpec {
        channels: format.channels(),
        sample_rate: format.rate(),
        bits_per_sample: format.sample_type().bits() as u16,
        sample_format,
    }
}

fn write_buffer(writer: &mut WavWriter<BufWriter<File>>, buffer: &Buffer) -> anyhow::Result<()> {
    match buffer.format().sample_type() {
        SampleType::U8 => {
            for &s in buffer.samples::<u8>()? {
                writer.write_sample((s as i16 - 128) as i8)?;
            }
        }
        SampleType::S16 => {
            for &s in buffer.samples::<i16>()? {
                writer.write_sample(s)?;
            }
        }
        SampleType::S24 => {
            for &s in buffer.samples::<S24>()? {
                writer.write_sample(s.get())?;
            }
        }
        SampleType::S32 => {
            for &s in buffer.samples::<i32>()? {
                writer.write_sample(s)?;
            }
        }
        SampleType::F32 => {
            for &s in buffer.samples::<f32>()? {
                writer.write_sample(s)?;
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!(
            "usage: {} <input.wav> <output.wav> <rate> [channels] [u8|s16|s24|s32|f32]",
            args.first().map(String::as_str).unwrap_or("wav_convert")
        );
    }

    let input_path = Path::new(&args[1]);
    let output_path = Path::new(&args[2]);
    let rate: u32 = args[3].parse().context("parsing output rate")?;

    let source = read_wav(input_path)?;
    let input = source.format();

    let channels = match args.get(4) {
        Some(arg) => arg.parse().context("parsing output channel count")?,
        None => input.channels(),
    };
    let sample_type = match args.get(5) {
        Some(name) => SampleType::from_name(name)
            .with_context(|| format!("unknown sample type {:?}", name))?,
        None => input.sample_type(),
    };
    let output = Format::try_new(channels, rate, sample_type)?;

    info!("{}: {} frames, {}", input_path.display(), source.size(), input);

    let mut converter = Converter::new(ConverterOptions::new(input, output))?;
    let mut writer = WavWriter::create(output_path, wav_spec(output))
        .with_context(|| format!("creating {}", output_path.display()))?;

    let mut pos = 0;
    while pos < source.size() {
        let converted = converter.process(source.span(pos, CHUNK_FRAMES))?;
        write_buffer(&mut writer, &converted)?;
        pos += CHUNK_FRAMES;
    }
    writer.finalize()?;

    let stats = converter.stats();
    info!(
        "{}: {} frames, {} ({} input frames left pending)",
        output_path.display(),
        stats.frames_produced,
        output,
        converter.pending_frames()
    );
    Ok(())
}
