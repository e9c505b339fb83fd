use std::f32::consts::TAU;
use std::path::Path;

use clipharvest::features::{FeatureExtractor, FeatureSet, FEATURE_NAMES};
use clipharvest::types::AudioData;
use ndarray::Axis;

const SAMPLE_RATE: u32 = 22050;

fn sine_clip(freq: f32, seconds: f32) -> AudioData {
    let count = (SAMPLE_RATE as f32 * seconds) as usize;
    let samples = (0..count)
        .map(|i| (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * 0.5)
        .collect();
    AudioData {
        samples,
        sample_rate: SAMPLE_RATE,
    }
}

fn write_wav(audio: &AudioData, path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in &audio.samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

fn assert_catalog_complete(features: &FeatureSet) {
    let value = features.to_json();
    let object = value.as_object().expect("feature json is an object");
    assert_eq!(object.len(), FEATURE_NAMES.len());
    for name in FEATURE_NAMES {
        let array = object
            .get(name)
            .unwrap_or_else(|| panic!("missing feature {name}"))
            .as_array()
            .unwrap_or_else(|| panic!("feature {name} is not an array"));
        assert!(!array.is_empty(), "feature {name} is empty");
    }
}

#[test]
fn sine_clip_produces_the_complete_catalog() {
    let audio = sine_clip(440.0, 1.0);
    let features = FeatureExtractor::new().extract(&audio);
    assert_catalog_complete(&features);
}

#[test]
fn two_dimensional_features_have_expected_band_counts() {
    let audio = sine_clip(440.0, 1.0);
    let features = FeatureExtractor::new().extract(&audio);

    assert_eq!(features.chroma_stft.len_of(Axis(0)), 12);
    assert_eq!(features.chroma_cqt.len_of(Axis(0)), 12);
    assert_eq!(features.chroma_cens.len_of(Axis(0)), 12);
    assert_eq!(features.melspectrogram.len_of(Axis(0)), 128);
    assert_eq!(features.mfcc.len_of(Axis(0)), 20);
    assert_eq!(features.spectral_contrast.len_of(Axis(0)), 7);
    assert_eq!(features.poly_features.len_of(Axis(0)), 2);
    assert_eq!(features.tonnetz.len_of(Axis(0)), 6);
}

#[test]
fn frame_counts_agree_across_spectral_features() {
    let audio = sine_clip(440.0, 1.0);
    let features = FeatureExtractor::new().extract(&audio);

    let frames = features.spectral_centroid.len();
    assert!(frames > 0);
    assert_eq!(features.spectral_bandwidth.len(), frames);
    assert_eq!(features.spectral_flatness.len(), frames);
    assert_eq!(features.spectral_rolloff.len(), frames);
    assert_eq!(features.chroma_stft.len_of(Axis(1)), frames);
    assert_eq!(features.melspectrogram.len_of(Axis(1)), frames);
}

#[test]
fn pure_tone_statistics_are_plausible() {
    let audio = sine_clip(440.0, 1.0);
    let features = FeatureExtractor::new().extract(&audio);

    // 0.5 amplitude sine has rms around 0.35
    let mean_rms: f32 =
        features.rms.iter().copied().sum::<f32>() / features.rms.len() as f32;
    assert!(mean_rms > 0.2 && mean_rms < 0.5, "rms {mean_rms}");

    // A sine crosses zero twice per cycle
    let expected_zcr = 2.0 * 440.0 / SAMPLE_RATE as f32;
    let mid_zcr = features.zero_crossing_rate[features.zero_crossing_rate.len() / 2];
    assert!(
        (mid_zcr - expected_zcr).abs() < expected_zcr * 0.5,
        "zcr {mid_zcr} vs {expected_zcr}"
    );

    // Spectral mass concentrates near the tone
    let mid_centroid = features.spectral_centroid[features.spectral_centroid.len() / 2];
    assert!(
        mid_centroid > 200.0 && mid_centroid < 1500.0,
        "centroid {mid_centroid}"
    );

    // A pure tone is highly non-flat
    let mid_flatness = features.spectral_flatness[features.spectral_flatness.len() / 2];
    assert!(mid_flatness < 0.3, "flatness {mid_flatness}");
}

#[test]
fn extract_file_reads_back_a_sliced_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sliced_fixture.wav");
    write_wav(&sine_clip(440.0, 1.0), &path);

    let features = FeatureExtractor::new().extract_file(&path).unwrap();
    assert_catalog_complete(&features);
}

#[test]
fn extract_all_isolates_per_clip_failures() {
    let dir = tempfile::tempdir().unwrap();
    write_wav(
        &sine_clip(440.0, 1.0),
        &dir.path().join("sliced_good.wav"),
    );
    std::fs::write(dir.path().join("sliced_bad.wav"), b"not a wav").unwrap();

    let ids = vec!["good".to_string(), "bad".to_string(), "absent".to_string()];
    let features = FeatureExtractor::new().extract_all(dir.path(), &ids);

    assert_eq!(features.len(), 1);
    assert!(features.contains_key("good"));
}

#[test]
fn identical_clips_produce_identical_features() {
    let audio = sine_clip(440.0, 0.5);
    let extractor = FeatureExtractor::new();
    let first = extractor.extract(&audio);
    let second = extractor.extract(&audio);
    assert_eq!(first.to_json(), second.to_json());
}
