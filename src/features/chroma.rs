//! Pitch-class descriptors: chroma projections, energy-normalized
//! chroma statistics, and the tonal centroid transform.

pub(crate) const PITCH_CLASSES: usize = 12;
pub(crate) const TONNETZ_DIMS: usize = 6;

const A4_FREQ: f64 = 440.0;
const C1_FREQ: f64 = 32.703_195_662_574_83;
const CENS_SMOOTH_WINDOW: usize = 41;
const CENS_STEPS: [(f64, f64); 4] = [(0.05, 0.25), (0.1, 0.25), (0.2, 0.25), (0.4, 0.25)];
const EPSILON: f64 = 1e-10;

/// Chroma from the STFT power spectrum: each bin's energy lands on the
/// pitch class of its nearest equal-tempered note. Frame-major rows of
/// 12, each frame scaled to a unit maximum.
pub(crate) fn chroma_stft(power: &[Vec<f64>], freqs: &[f64]) -> Vec<Vec<f64>> {
    project(power, freqs, |freq| {
        let midi = 69.0 + 12.0 * (freq / A4_FREQ).log2();
        if midi < 0.0 {
            return None;
        }
        let class = (midi.round() as i64).rem_euclid(PITCH_CLASSES as i64) as usize;
        Some(vec![(class, 1.0)])
    })
}

/// Chroma from a log-frequency (pseudo constant-Q) projection anchored
/// at C1: bin energy splits linearly between the two neighboring
/// semitone bins before folding to 12 classes.
pub(crate) fn chroma_cqt(power: &[Vec<f64>], freqs: &[f64]) -> Vec<Vec<f64>> {
    project(power, freqs, |freq| {
        let position = PITCH_CLASSES as f64 * (freq / C1_FREQ).log2();
        if position < 0.0 {
            return None;
        }
        let lower = position.floor();
        let upper_weight = position - lower;
        let lower_class = (lower as i64).rem_euclid(PITCH_CLASSES as i64) as usize;
        let upper_class = (lower_class + 1) % PITCH_CLASSES;
        Some(vec![
            (lower_class, 1.0 - upper_weight),
            (upper_class, upper_weight),
        ])
    })
}

fn project<F>(power: &[Vec<f64>], freqs: &[f64], classify: F) -> Vec<Vec<f64>>
where
    F: Fn(f64) -> Option<Vec<(usize, f64)>>,
{
    power
        .iter()
        .map(|frame| {
            let mut chroma = vec![0.0_f64; PITCH_CLASSES];
            for (&p, &freq) in frame.iter().zip(freqs.iter()) {
                if freq <= 0.0 {
                    continue;
                }
                if let Some(targets) = classify(freq) {
                    for (class, weight) in targets {
                        chroma[class] += p.max(0.0) * weight;
                    }
                }
            }
            scale_to_unit_max(&mut chroma);
            chroma
        })
        .collect()
}

fn scale_to_unit_max(chroma: &mut [f64]) {
    let max = chroma.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in chroma.iter_mut() {
            *value /= max;
        }
    }
}

/// Energy-normalized chroma statistics: L1-normalize each frame,
/// quantize against fixed thresholds, smooth along time, then
/// L2-normalize each frame.
pub(crate) fn chroma_cens(chroma: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let quantized: Vec<Vec<f64>> = chroma
        .iter()
        .map(|frame| {
            let l1: f64 = frame.iter().map(|v| v.abs()).sum();
            frame
                .iter()
                .map(|&v| {
                    let normalized = if l1 > 0.0 { v / l1 } else { 0.0 };
                    CENS_STEPS
                        .iter()
                        .map(|&(threshold, weight)| {
                            if normalized > threshold {
                                weight
                            } else {
                                0.0
                            }
                        })
                        .sum()
                })
                .collect()
        })
        .collect();

    let smoothed = smooth_over_time(&quantized, CENS_SMOOTH_WINDOW);
    smoothed
        .into_iter()
        .map(|frame| {
            let l2 = frame.iter().map(|v| v * v).sum::<f64>().sqrt();
            if l2 > 0.0 {
                frame.into_iter().map(|v| v / l2).collect()
            } else {
                frame
            }
        })
        .collect()
}

fn smooth_over_time(frames: &[Vec<f64>], window: usize) -> Vec<Vec<f64>> {
    if frames.is_empty() || window < 2 {
        return frames.to_vec();
    }
    let radius = window / 2;
    let classes = frames[0].len();
    let mut smoothed = Vec::with_capacity(frames.len());
    for idx in 0..frames.len() {
        let start = idx.saturating_sub(radius);
        let end = (idx + radius + 1).min(frames.len());
        let count = (end - start) as f64;
        let mut frame = vec![0.0_f64; classes];
        for neighbor in &frames[start..end] {
            for (sum, &value) in frame.iter_mut().zip(neighbor.iter()) {
                *sum += value;
            }
        }
        for value in frame.iter_mut() {
            *value /= count;
        }
        smoothed.push(frame);
    }
    smoothed
}

/// Tonal centroid projection: each L1-normalized chroma frame mapped
/// onto the fifths, minor-third, and major-third circles.
pub(crate) fn tonnetz(chroma: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let basis = tonnetz_basis();
    chroma
        .iter()
        .map(|frame| {
            let l1: f64 = frame.iter().map(|v| v.abs()).sum();
            let mut centroid = vec![0.0_f64; TONNETZ_DIMS];
            if l1 <= EPSILON {
                return centroid;
            }
            for (dim, row) in basis.iter().enumerate() {
                centroid[dim] = frame
                    .iter()
                    .zip(row.iter())
                    .map(|(&v, &b)| (v / l1) * b)
                    .sum();
            }
            centroid
        })
        .collect()
}

// Interval circles: fifths (r=1), minor thirds (r=1), major thirds (r=0.5).
fn tonnetz_basis() -> [[f64; PITCH_CLASSES]; TONNETZ_DIMS] {
    use std::f64::consts::PI;
    let mut basis = [[0.0; PITCH_CLASSES]; TONNETZ_DIMS];
    for class in 0..PITCH_CLASSES {
        let k = class as f64;
        basis[0][class] = (k * 7.0 * PI / 6.0).sin();
        basis[1][class] = (k * 7.0 * PI / 6.0).cos();
        basis[2][class] = (k * 3.0 * PI / 2.0).sin();
        basis[3][class] = (k * 3.0 * PI / 2.0).cos();
        basis[4][class] = 0.5 * (k * 2.0 * PI / 3.0).sin();
        basis[5][class] = 0.5 * (k * 2.0 * PI / 3.0).cos();
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum_with_peak_at(freq: f64, bins: usize, step: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
        let freqs: Vec<f64> = (0..bins).map(|i| i as f64 * step).collect();
        let mut frame = vec![0.0_f64; bins];
        let bin = (freq / step).round() as usize;
        frame[bin] = 1.0;
        (vec![frame], freqs)
    }

    #[test]
    fn a440_lands_on_pitch_class_nine() {
        let (power, freqs) = spectrum_with_peak_at(440.0, 1025, 22050.0 / 2048.0);
        let chroma = chroma_stft(&power, &freqs);
        let best = chroma[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(best, 9);
    }

    #[test]
    fn cqt_chroma_peaks_on_the_same_class() {
        let (power, freqs) = spectrum_with_peak_at(440.0, 1025, 22050.0 / 2048.0);
        let chroma = chroma_cqt(&power, &freqs);
        let best = chroma[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(best, 9);
    }

    #[test]
    fn cens_frames_have_unit_l2_norm() {
        let (power, freqs) = spectrum_with_peak_at(440.0, 1025, 22050.0 / 2048.0);
        let cens = chroma_cens(&chroma_cqt(&power, &freqs));
        let l2: f64 = cens[0].iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((l2 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tonnetz_of_silence_is_zero() {
        let chroma = vec![vec![0.0_f64; PITCH_CLASSES]];
        let centroids = tonnetz(&chroma);
        assert!(centroids[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn tonnetz_rows_have_six_dimensions() {
        let (power, freqs) = spectrum_with_peak_at(440.0, 1025, 22050.0 / 2048.0);
        let centroids = tonnetz(&chroma_cqt(&power, &freqs));
        assert_eq!(centroids[0].len(), TONNETZ_DIMS);
    }
}
