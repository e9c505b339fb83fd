//! Per-entry orchestration: fetch -> extract -> features, strictly
//! sequential in catalog order.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::extract::ClipExtractor;
use crate::features::{write_features_json, FeatureExtractor, FeatureSet};
use crate::fetch::{MediaFetcher, MediaSource};
use crate::types::{CatalogEntry, EntryOutcome, ExtractOutcome, FetchOutcome};

/// Run-scoped state threaded through the stages: which ids were
/// fetched this run, and the per-clip feature accumulator.
#[derive(Debug, Default)]
pub struct RunContext {
    pub downloaded: Vec<String>,
    pub features: BTreeMap<String, FeatureSet>,
    pub outcomes: Vec<(String, EntryOutcome)>,
}

/// Sequences the three stages over a parsed dataset index.
pub struct Pipeline<S: MediaSource> {
    fetcher: MediaFetcher<S>,
    extractor: ClipExtractor,
    features: FeatureExtractor,
}

impl<S: MediaSource> Pipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            fetcher: MediaFetcher::new(source),
            extractor: ClipExtractor::new(),
            features: FeatureExtractor::new(),
        }
    }

    /// Process every entry in order. Per-entry failures are logged and
    /// recorded as outcomes; only environmental errors (an unusable
    /// destination directory) abort the run.
    pub fn run(
        &self,
        dest_dir: &Path,
        entries: &[CatalogEntry],
        redo: bool,
    ) -> Result<RunContext> {
        let mut context = RunContext::default();
        for (index, entry) in entries.iter().enumerate() {
            info!(
                source_id = %entry.source_id,
                entry = index + 1,
                total = entries.len(),
                "processing entry"
            );
            let outcome = self.process_entry(dest_dir, entry, redo, &mut context)?;
            context.outcomes.push((entry.source_id.clone(), outcome));
        }
        Ok(context)
    }

    fn process_entry(
        &self,
        dest_dir: &Path,
        entry: &CatalogEntry,
        redo: bool,
        context: &mut RunContext,
    ) -> Result<EntryOutcome> {
        let staged = match self
            .fetcher
            .fetch_if_needed(dest_dir, &entry.source_id, redo)?
        {
            FetchOutcome::Skipped => return Ok(EntryOutcome::Skipped),
            FetchOutcome::Failed => return Ok(EntryOutcome::FetchFailed),
            FetchOutcome::Fetched(staged) => staged,
        };
        context.downloaded.push(entry.source_id.clone());

        let artifact = match self.extractor.extract_window(
            dest_dir,
            &entry.source_id,
            &staged,
            entry.start_time,
            entry.end_time,
        ) {
            Ok(ExtractOutcome::Extracted(artifact)) => artifact,
            Ok(ExtractOutcome::Unsupported) => return Ok(EntryOutcome::Unsupported),
            Err(err) => {
                warn!(source_id = %entry.source_id, error = %err, "extraction failed");
                return Ok(EntryOutcome::ExtractFailed);
            }
        };

        let feature_set = match self.features.extract_file(&artifact) {
            Ok(feature_set) => feature_set,
            Err(err) => {
                warn!(source_id = %entry.source_id, error = %err, "feature computation failed");
                return Ok(EntryOutcome::FeatureFailed);
            }
        };
        let json_path = dest_dir.join(format!("features_{}.json", entry.source_id));
        if let Err(err) = write_features_json(&feature_set, &json_path) {
            warn!(source_id = %entry.source_id, error = %err, "failed to persist features");
        }
        context
            .features
            .insert(entry.source_id.clone(), feature_set);
        Ok(EntryOutcome::Done)
    }
}
