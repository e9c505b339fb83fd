//! Container decode to mono f32 samples via symphonia.

use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use crate::types::AudioData;

/// Decode an audio file to raw PCM samples (mono, f32)
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open staged media {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe media format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in staged media")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate not specified in staged media")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("Failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder
            .decode(&packet)
            .context("Failed to decode audio packet")?;
        extend_mono_f32(&mut samples, &decoded);
    }

    Ok(AudioData {
        samples,
        sample_rate,
    })
}

/// Downmix one decoded buffer into `out`, normalized to [-1.0, 1.0].
fn extend_mono_f32(out: &mut Vec<f32>, decoded: &AudioBufferRef) {
    match decoded {
        AudioBufferRef::U8(buf) => mixdown(out, buf, |s| s as f32 / 128.0 - 1.0),
        AudioBufferRef::U16(buf) => mixdown(out, buf, |s| s as f32 / 32768.0 - 1.0),
        AudioBufferRef::U24(buf) => mixdown(out, buf, |s| s.inner() as f32 / 8_388_608.0 - 1.0),
        AudioBufferRef::U32(buf) => mixdown(out, buf, |s| s as f32 / 2_147_483_648.0 - 1.0),
        AudioBufferRef::S8(buf) => mixdown(out, buf, |s| s as f32 / 128.0),
        AudioBufferRef::S16(buf) => mixdown(out, buf, |s| s as f32 / 32768.0),
        AudioBufferRef::S24(buf) => mixdown(out, buf, |s| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => mixdown(out, buf, |s| s as f32 / 2_147_483_648.0),
        AudioBufferRef::F32(buf) => mixdown(out, buf, |s| s),
        AudioBufferRef::F64(buf) => mixdown(out, buf, |s| s as f32),
    }
}

fn mixdown<T: Sample, F: Fn(T) -> f32>(out: &mut Vec<f32>, buf: &AudioBuffer<T>, convert: F) {
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 1 {
        out.extend(buf.chan(0).iter().map(|&s| convert(s)));
        return;
    }
    out.reserve(frames);
    for frame in 0..frames {
        let mut sum = 0.0_f32;
        for ch in 0..channels {
            sum += convert(buf.chan(ch)[frame]);
        }
        out.push(sum / channels as f32);
    }
}
