use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clipharvest::catalog::{self, LabelIndex};
use clipharvest::fetch::http::HttpMediaSource;
use clipharvest::pipeline::Pipeline;

const ONTOLOGY_FILE: &str = "ontology.json";
const DEFAULT_MEDIA_URL: &str = "https://media.audioset.example/v1/clips";

/// clipharvest - labeled audio-clip dataset builder
///
/// Resolves label names against the catalog ontology, fetches the
/// media referenced by dataset segment indexes, cuts the labeled time
/// window out of each, and computes acoustic descriptors per clip.
#[derive(Parser, Debug)]
#[command(name = "clipharvest")]
#[command(version = "0.1.0")]
#[command(about = "Labeled audio-clip dataset builder", long_about = None)]
struct Args {
    /// Dataset segment index files to process
    #[arg(short = 'd', long = "datasets", required = true, num_args = 1..)]
    datasets: Vec<PathBuf>,

    /// Label names to resolve against the ontology
    #[arg(short = 'l', long = "labels", required = true, num_args = 1..)]
    labels: Vec<String>,

    /// Re-fetch and re-extract even when a sliced artifact exists
    #[arg(short = 'r', long = "redo")]
    redo: bool,

    /// Directory holding ontology.json and other reference files
    #[arg(long, value_name = "DIR", default_value = "ReferDoc")]
    refer_dir: PathBuf,

    /// Output root for sliced artifacts and feature files
    #[arg(long, value_name = "DIR", default_value = "audio_balanced_train")]
    dest_dir: PathBuf,

    /// Base URL of the catalog media endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_MEDIA_URL)]
    media_url: String,
}

impl Args {
    fn validate(&self) -> Result<()> {
        for dataset in &self.datasets {
            if !dataset.is_file() {
                anyhow::bail!("Dataset index is not a readable file: {:?}", dataset);
            }
        }
        if !self.refer_dir.join(ONTOLOGY_FILE).is_file() {
            anyhow::bail!(
                "Ontology file not found at {:?}",
                self.refer_dir.join(ONTOLOGY_FILE)
            );
        }
        if self.dest_dir.exists() && !self.dest_dir.is_dir() {
            anyhow::bail!("Output path must be a directory: {:?}", self.dest_dir);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    println!("clipharvest v0.1.0 - labeled audio-clip dataset builder");
    println!("Datasets: {:?}", args.datasets);
    println!("Output root: {:?}", args.dest_dir);

    let ontology_path = args.refer_dir.join(ONTOLOGY_FILE);
    let label_index = LabelIndex::load(&ontology_path)
        .with_context(|| format!("Failed to load ontology {:?}", ontology_path))?;

    println!("\n1. Resolving labels...");
    for label in &args.labels {
        match label_index.resolve_label(label) {
            Some(id) => println!("   {label} -> {id}"),
            None => println!("   {label} -> not present in ontology"),
        }
    }

    let pipeline = Pipeline::new(HttpMediaSource::new(args.media_url.clone()));
    for dataset in &args.datasets {
        println!("\n2. Parsing dataset index {:?}...", dataset);
        let entries = catalog::parse_entries(dataset)
            .with_context(|| format!("Failed to parse dataset index {:?}", dataset))?;
        println!("   Found {} entries", entries.len());

        let dest_dir = dataset_dest_dir(&args.dest_dir, dataset, args.datasets.len());
        println!("\n3. Processing entries into {:?}...", dest_dir);
        let context = pipeline
            .run(&dest_dir, &entries, args.redo)
            .with_context(|| format!("Pipeline run failed for {:?}", dataset))?;
        println!(
            "   Fetched {} clip(s), computed features for {} clip(s)",
            context.downloaded.len(),
            context.features.len()
        );
    }

    println!("\n✓ Processing complete!");
    Ok(())
}

/// With a single dataset the output root is used directly; with several
/// each dataset gets a subdirectory named after its file stem.
fn dataset_dest_dir(root: &Path, dataset: &Path, dataset_count: usize) -> PathBuf {
    if dataset_count <= 1 {
        return root.to_path_buf();
    }
    let stem = dataset
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    root.join(stem)
}
