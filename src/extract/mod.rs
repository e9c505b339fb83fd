//! Window extraction: decode staged media, cut the labeled time
//! window, persist it as an uncompressed WAV artifact.

pub mod decode;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::fetch::{sliced_path, STAGING_DIR};
use crate::types::{AudioData, ExtractOutcome, MediaFormat, StagedMedia};

/// Cuts the `[start, end)` window out of staged media and writes the
/// sliced artifact. The staging directory never survives this stage,
/// whatever the outcome.
#[derive(Debug, Default)]
pub struct ClipExtractor {}

impl ClipExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice `staged` to `dest_dir/sliced_<id>.wav`.
    ///
    /// Unsupported container formats discard the staging area and
    /// report `ExtractOutcome::Unsupported` without error. Decode or
    /// write failures propagate to the caller after the staging area
    /// has been removed.
    pub fn extract_window(
        &self,
        dest_dir: &Path,
        source_id: &str,
        staged: &StagedMedia,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Result<ExtractOutcome> {
        let staging = dest_dir.join(STAGING_DIR);
        let result = match staged.format {
            MediaFormat::M4a | MediaFormat::Opus => {
                self.slice_to_artifact(dest_dir, source_id, staged, start_seconds, end_seconds)
            }
            MediaFormat::Other(ref ext) => {
                warn!(source_id, container = %ext, "unsupported container, discarding");
                discard_staging(&staging);
                return Ok(ExtractOutcome::Unsupported);
            }
        };
        // Raw media is never retained, success or failure.
        discard_staging(&staging);
        result.map(ExtractOutcome::Extracted)
    }

    fn slice_to_artifact(
        &self,
        dest_dir: &Path,
        source_id: &str,
        staged: &StagedMedia,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Result<PathBuf> {
        let full = decode::decode_audio(&staged.path)?;
        let sliced = slice_window(&full, start_seconds, end_seconds);
        let artifact = sliced_path(dest_dir, source_id);
        write_wav(&sliced, &artifact)?;
        info!(
            source_id,
            duration_seconds = sliced.duration_seconds(),
            "wrote sliced artifact"
        );
        Ok(artifact)
    }
}

/// Pure function to cut a time window out of decoded audio.
///
/// Boundaries resolve at millisecond precision; a window end past the
/// source duration truncates to the available samples.
pub fn slice_window(audio: &AudioData, start_seconds: f64, end_seconds: f64) -> AudioData {
    let sr = audio.sample_rate as u64;
    let start_ms = (start_seconds * 1000.0).max(0.0) as u64;
    let end_ms = (end_seconds * 1000.0).max(0.0) as u64;
    let start_sample = ((start_ms * sr) / 1000) as usize;
    let end_sample = ((end_ms * sr) / 1000) as usize;

    let start_sample = start_sample.min(audio.samples.len());
    let end_sample = end_sample.clamp(start_sample, audio.samples.len());

    AudioData {
        samples: audio.samples[start_sample..end_sample].to_vec(),
        sample_rate: audio.sample_rate,
    }
}

/// Write mono PCM16 WAV, the fixed artifact format for sliced clips.
pub fn write_wav(audio: &AudioData, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file {:?}", path))?;
    for &sample in &audio.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer
            .write_sample(scaled)
            .context("Failed to write audio sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

fn discard_staging(staging: &Path) {
    if staging.exists() {
        if let Err(err) = fs::remove_dir_all(staging) {
            warn!(path = ?staging, error = %err, "failed to remove staging directory");
        }
    }
}
