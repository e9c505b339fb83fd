//! Fetch-or-skip stage: media source abstraction and idempotent staging.

pub mod http;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::types::{FetchOutcome, StagedMedia};

/// Prefix of the final per-clip artifact; its presence is the sole
/// idempotency signal for a source id.
pub const SLICED_PREFIX: &str = "sliced_";
/// Staging subdirectory reused entry-to-entry; holds at most one
/// entry's raw media at a time.
pub const STAGING_DIR: &str = "tmp";

/// Capability that obtains raw audio for a source id and stages it
/// under the given directory, reporting the exact file it wrote.
pub trait MediaSource {
    fn fetch_audio(&self, source_id: &str, staging_dir: &Path) -> Result<StagedMedia>;
}

/// Path of the final sliced artifact for a source id.
pub fn sliced_path(dest_dir: &Path, source_id: &str) -> std::path::PathBuf {
    dest_dir.join(format!("{SLICED_PREFIX}{source_id}.wav"))
}

/// Drives the fetch-or-skip decision for one entry.
pub struct MediaFetcher<S: MediaSource> {
    source: S,
}

impl<S: MediaSource> MediaFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Ensure `dest_dir` exists, skip if the sliced artifact is already
    /// present (unless `redo`), otherwise stage fresh media under
    /// `dest_dir/tmp`.
    ///
    /// Fetch failures are reported as `FetchOutcome::Failed` and never
    /// propagate; the staging directory does not survive a failure.
    pub fn fetch_if_needed(
        &self,
        dest_dir: &Path,
        source_id: &str,
        redo: bool,
    ) -> Result<FetchOutcome> {
        fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create destination directory {:?}", dest_dir))?;

        if !redo && sliced_path(dest_dir, source_id).exists() {
            info!(source_id, "already processed, skipping fetch");
            return Ok(FetchOutcome::Skipped);
        }

        let staging = dest_dir.join(STAGING_DIR);
        // A killed run can leave stale staged media behind; clear it so
        // this entry's fetch starts from an empty staging area.
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to clear stale staging {:?}", staging))?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Failed to create staging directory {:?}", staging))?;

        match self.source.fetch_audio(source_id, &staging) {
            Ok(staged) => {
                info!(source_id, path = ?staged.path, "staged raw media");
                Ok(FetchOutcome::Fetched(staged))
            }
            Err(err) => {
                warn!(source_id, error = %err, "fetch failed");
                let _ = fs::remove_dir_all(&staging);
                Ok(FetchOutcome::Failed)
            }
        }
    }
}
