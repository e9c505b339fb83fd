//! Core types for the clipharvest dataset pipeline

use std::path::PathBuf;

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 44100)
    pub sample_rate: u32,
}

impl AudioData {
    /// Duration of the audio in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// One labeled segment from a dataset index: which source to fetch and
/// which time window to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub source_id: String,
    pub start_time: f64, // seconds
    pub end_time: f64,   // seconds
}

/// Container format of a staged media file, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFormat {
    M4a,
    Opus,
    Other(String),
}

impl MediaFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "m4a" => MediaFormat::M4a,
            "opus" => MediaFormat::Opus,
            other => MediaFormat::Other(other.to_string()),
        }
    }
}

/// Raw media staged by a fetch, named explicitly so later stages never
/// have to scan the staging directory.
#[derive(Debug, Clone)]
pub struct StagedMedia {
    pub path: PathBuf,
    pub format: MediaFormat,
}

/// Result of the fetch-or-skip decision for one entry.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Media staged under the tmp directory, ready for extraction.
    Fetched(StagedMedia),
    /// The sliced artifact already exists and redo was not requested.
    Skipped,
    /// The fetch capability failed; nothing staged.
    Failed,
}

/// Result of the window-extraction stage for one entry.
#[derive(Debug, PartialEq)]
pub enum ExtractOutcome {
    /// Sliced artifact written to the given path.
    Extracted(PathBuf),
    /// Staged media used a container we do not decode; staging discarded.
    Unsupported,
}

/// Terminal state of one catalog entry after a pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Done,
    Skipped,
    FetchFailed,
    Unsupported,
    ExtractFailed,
    FeatureFailed,
}
