//! Acoustic descriptor catalog computed from sliced clip artifacts.

mod chroma;
mod mel;
mod spectral;
mod spectrum;
mod temporal;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2};
use serde_json::{json, Value};
use tracing::warn;

use crate::fetch::sliced_path;
use crate::types::AudioData;

use spectrum::{FRAME_SIZE, HOP_SIZE};

/// The fixed descriptor catalog, in computation order.
pub const FEATURE_NAMES: [&str; 14] = [
    "chroma_stft",
    "chroma_cqt",
    "chroma_cens",
    "melspectrogram",
    "mfcc",
    "rms",
    "spectral_centroid",
    "spectral_bandwidth",
    "spectral_contrast",
    "spectral_flatness",
    "spectral_rolloff",
    "poly_features",
    "tonnetz",
    "zero_crossing_rate",
];

/// All descriptors for one clip. 2-D features are band x frame, 1-D
/// features carry one value per analysis frame.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub chroma_stft: Array2<f32>,
    pub chroma_cqt: Array2<f32>,
    pub chroma_cens: Array2<f32>,
    pub melspectrogram: Array2<f32>,
    pub mfcc: Array2<f32>,
    pub rms: Array1<f32>,
    pub spectral_centroid: Array1<f32>,
    pub spectral_bandwidth: Array1<f32>,
    pub spectral_contrast: Array2<f32>,
    pub spectral_flatness: Array1<f32>,
    pub spectral_rolloff: Array1<f32>,
    pub poly_features: Array2<f32>,
    pub tonnetz: Array2<f32>,
    pub zero_crossing_rate: Array1<f32>,
}

impl FeatureSet {
    /// Render the catalog as a JSON object keyed by feature name, with
    /// plain nested arrays as values.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("chroma_stft".into(), matrix_json(&self.chroma_stft));
        map.insert("chroma_cqt".into(), matrix_json(&self.chroma_cqt));
        map.insert("chroma_cens".into(), matrix_json(&self.chroma_cens));
        map.insert("melspectrogram".into(), matrix_json(&self.melspectrogram));
        map.insert("mfcc".into(), matrix_json(&self.mfcc));
        map.insert("rms".into(), vector_json(&self.rms));
        map.insert(
            "spectral_centroid".into(),
            vector_json(&self.spectral_centroid),
        );
        map.insert(
            "spectral_bandwidth".into(),
            vector_json(&self.spectral_bandwidth),
        );
        map.insert(
            "spectral_contrast".into(),
            matrix_json(&self.spectral_contrast),
        );
        map.insert(
            "spectral_flatness".into(),
            vector_json(&self.spectral_flatness),
        );
        map.insert(
            "spectral_rolloff".into(),
            vector_json(&self.spectral_rolloff),
        );
        map.insert("poly_features".into(), matrix_json(&self.poly_features));
        map.insert("tonnetz".into(), matrix_json(&self.tonnetz));
        map.insert(
            "zero_crossing_rate".into(),
            vector_json(&self.zero_crossing_rate),
        );
        Value::Object(map)
    }
}

fn matrix_json(matrix: &Array2<f32>) -> Value {
    Value::Array(
        matrix
            .outer_iter()
            .map(|row| Value::Array(row.iter().map(|&v| json!(v)).collect()))
            .collect(),
    )
}

fn vector_json(vector: &Array1<f32>) -> Value {
    Value::Array(vector.iter().map(|&v| json!(v)).collect())
}

/// Computes the descriptor catalog for sliced clip artifacts.
#[derive(Debug, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the full catalog from decoded audio. Pure function of
    /// (samples, sample rate); computation order is fixed.
    pub fn extract(&self, audio: &AudioData) -> FeatureSet {
        let spectra = spectrum::analyze(&audio.samples, audio.sample_rate);
        let chroma_stft = chroma::chroma_stft(&spectra.power, &spectra.freqs);
        let chroma_cqt = chroma::chroma_cqt(&spectra.power, &spectra.freqs);
        let chroma_cens = chroma::chroma_cens(&chroma_cqt);
        let mel_raw = mel::mel_spectrogram(&spectra.power, &spectra.freqs, audio.sample_rate);
        let mfcc_raw = mel::mfcc(&mel_raw);
        let rms = temporal::rms(&audio.samples, FRAME_SIZE, HOP_SIZE);
        let centroids = spectral::centroid(&spectra.power, &spectra.freqs);
        let bandwidths = spectral::bandwidth(&spectra.power, &spectra.freqs, &centroids);
        let contrast = spectral::contrast(&spectra.power, &spectra.freqs, audio.sample_rate);
        let flatness = spectral::flatness(&spectra.power);
        let rolloff = spectral::rolloff(&spectra.power, &spectra.freqs, audio.sample_rate);
        let poly = spectral::poly(&spectra.magnitude, &spectra.freqs);
        let tonnetz = chroma::tonnetz(&chroma_cqt);
        let zero_crossing_rate =
            temporal::zero_crossing_rate(&audio.samples, FRAME_SIZE, HOP_SIZE);

        FeatureSet {
            chroma_stft: band_major_f64(&chroma_stft),
            chroma_cqt: band_major_f64(&chroma_cqt),
            chroma_cens: band_major_f64(&chroma_cens),
            melspectrogram: band_major_f64(&mel_raw),
            mfcc: band_major_f64(&mfcc_raw),
            rms: Array1::from_vec(rms),
            spectral_centroid: Array1::from_vec(centroids),
            spectral_bandwidth: Array1::from_vec(bandwidths),
            spectral_contrast: band_major_f32(&contrast),
            spectral_flatness: Array1::from_vec(flatness),
            spectral_rolloff: Array1::from_vec(rolloff),
            poly_features: band_major_f32(&poly),
            tonnetz: band_major_f64(&tonnetz),
            zero_crossing_rate: Array1::from_vec(zero_crossing_rate),
        }
    }

    /// Load one sliced artifact and compute its catalog.
    pub fn extract_file(&self, path: &Path) -> Result<FeatureSet> {
        let audio = load_sliced(path)?;
        Ok(self.extract(&audio))
    }

    /// Compute catalogs for every id with a sliced artifact under
    /// `src_dir`. A clip that fails to load aborts that id only.
    pub fn extract_all(&self, src_dir: &Path, ids: &[String]) -> BTreeMap<String, FeatureSet> {
        let mut features = BTreeMap::new();
        for id in ids {
            let path = sliced_path(src_dir, id);
            match self.extract_file(&path) {
                Ok(set) => {
                    features.insert(id.clone(), set);
                }
                Err(err) => {
                    warn!(source_id = %id, error = %err, "feature extraction failed for clip");
                }
            }
        }
        features
    }
}

/// Persist one clip's catalog beside its sliced artifact.
pub fn write_features_json(features: &FeatureSet, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create feature file {:?}", path))?;
    serde_json::to_writer(file, &features.to_json())
        .with_context(|| format!("Failed to write feature file {:?}", path))?;
    Ok(())
}

fn load_sliced(path: &Path) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open sliced artifact {:?}", path))?;
    let spec = reader.spec();
    ensure!(
        spec.channels == 1,
        "expected mono sliced artifact, got {} channels",
        spec.channels
    );
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Failed to read samples from {:?}", path))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Failed to read samples from {:?}", path))?,
    };
    Ok(AudioData {
        samples,
        sample_rate: spec.sample_rate,
    })
}

fn band_major_f64(frames: &[Vec<f64>]) -> Array2<f32> {
    if frames.is_empty() {
        return Array2::zeros((0, 0));
    }
    let bands = frames[0].len();
    Array2::from_shape_fn((bands, frames.len()), |(band, frame)| {
        frames[frame][band] as f32
    })
}

fn band_major_f32(frames: &[Vec<f32>]) -> Array2<f32> {
    if frames.is_empty() {
        return Array2::zeros((0, 0));
    }
    let bands = frames[0].len();
    Array2::from_shape_fn((bands, frames.len()), |(band, frame)| frames[frame][band])
}
