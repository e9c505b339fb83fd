//! Reference-index access: ontology label lookup and segment index parsing.

use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::types::CatalogEntry;

/// One record from the ontology file. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OntologyRecord {
    pub id: String,
    pub name: String,
}

/// Label catalog loaded from an ontology file, read-only for the
/// lifetime of the run.
#[derive(Debug)]
pub struct LabelIndex {
    records: Vec<OntologyRecord>,
}

impl LabelIndex {
    /// Load the ontology from a JSON array of `{id, name, ...}` records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open ontology file {:?}", path))?;
        let records: Vec<OntologyRecord> = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse ontology file {:?}", path))?;
        Ok(Self { records })
    }

    /// Resolve a human-readable label name to its catalog identifier.
    /// First exact match wins; `None` is a lookup miss, not an error.
    pub fn resolve_label(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a dataset index file into ordered catalog entries.
///
/// The index is space-delimited with `|` as the quote character; each
/// record is re-joined on commas before interpretation. A line whose
/// re-joined text contains `#` is a comment and is dropped. Data lines
/// must yield at least five comma-separated fields, with the source id
/// at position 0 and start/end times at positions 2 and 4.
///
/// Any malformed line fails the whole load.
pub fn parse_entries<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntry>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset index {:?}", path))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .quote(b'|')
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut entries = Vec::new();
    for (line_no, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read line {} of {:?}", line_no + 1, path))?;
        let joined = record.iter().collect::<Vec<_>>().join(",");
        if joined.contains('#') {
            continue;
        }
        if joined.trim().is_empty() {
            continue;
        }
        entries.push(
            parse_data_line(&joined)
                .with_context(|| format!("Malformed line {} of {:?}", line_no + 1, path))?,
        );
    }
    Ok(entries)
}

fn parse_data_line(joined: &str) -> Result<CatalogEntry> {
    let fields: Vec<&str> = joined.split(',').collect();
    ensure!(
        fields.len() >= 5,
        "expected at least 5 fields, got {}",
        fields.len()
    );
    let source_id = fields[0].trim().to_string();
    ensure!(!source_id.is_empty(), "empty source id");
    let start_time: f64 = fields[2]
        .trim()
        .parse()
        .with_context(|| format!("invalid start time '{}'", fields[2]))?;
    let end_time: f64 = fields[4]
        .trim()
        .parse()
        .with_context(|| format!("invalid end time '{}'", fields[4]))?;
    Ok(CatalogEntry {
        source_id,
        start_time,
        end_time,
    })
}
