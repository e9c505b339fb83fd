//! Per-frame spectral shape descriptors computed from the shared STFT.

const ROLLOFF_FRACTION: f64 = 0.85;
const CONTRAST_FMIN: f64 = 200.0;
const CONTRAST_BANDS: usize = 6;
const CONTRAST_QUANTILE: f64 = 0.02;
const EPSILON: f64 = 1e-10;

/// Power-weighted mean frequency of each frame.
pub(crate) fn centroid(power: &[Vec<f64>], freqs: &[f64]) -> Vec<f32> {
    power
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|p| p.max(0.0)).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let weighted: f64 = frame
                .iter()
                .zip(freqs.iter())
                .map(|(&p, &f)| p.max(0.0) * f)
                .sum();
            (weighted / total) as f32
        })
        .collect()
}

/// Power-weighted standard deviation around the per-frame centroid.
pub(crate) fn bandwidth(power: &[Vec<f64>], freqs: &[f64], centroids: &[f32]) -> Vec<f32> {
    power
        .iter()
        .zip(centroids.iter())
        .map(|(frame, &center)| {
            let total: f64 = frame.iter().map(|p| p.max(0.0)).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let center = center as f64;
            let spread: f64 = frame
                .iter()
                .zip(freqs.iter())
                .map(|(&p, &f)| {
                    let diff = f - center;
                    p.max(0.0) * diff * diff
                })
                .sum();
            (spread / total).sqrt() as f32
        })
        .collect()
}

/// Frequency below which `ROLLOFF_FRACTION` of each frame's energy lies.
pub(crate) fn rolloff(power: &[Vec<f64>], freqs: &[f64], sample_rate: u32) -> Vec<f32> {
    let nyquist = sample_rate as f64 / 2.0;
    power
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|p| p.max(0.0)).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let target = total * ROLLOFF_FRACTION;
            let mut cumulative = 0.0_f64;
            for (bin, &p) in frame.iter().enumerate() {
                cumulative += p.max(0.0);
                if cumulative >= target {
                    return freqs.get(bin).copied().unwrap_or(nyquist) as f32;
                }
            }
            nyquist as f32
        })
        .collect()
}

/// Geometric-to-arithmetic mean ratio of each frame's power spectrum.
pub(crate) fn flatness(power: &[Vec<f64>]) -> Vec<f32> {
    power
        .iter()
        .map(|frame| {
            if frame.is_empty() {
                return 0.0;
            }
            let n = frame.len() as f64;
            let mut log_sum = 0.0_f64;
            let mut arith = 0.0_f64;
            for &p in frame {
                let p = p.max(0.0) + EPSILON;
                log_sum += p.ln();
                arith += p;
            }
            let geometric = (log_sum / n).exp();
            let arith = arith / n;
            if arith <= 0.0 {
                0.0
            } else {
                (geometric / arith) as f32
            }
        })
        .collect()
}

/// Octave-band peak-to-valley contrast in dB; frame-major rows of
/// `CONTRAST_BANDS + 1` values.
pub(crate) fn contrast(power: &[Vec<f64>], freqs: &[f64], sample_rate: u32) -> Vec<Vec<f32>> {
    let edges = contrast_edges(sample_rate);
    power
        .iter()
        .map(|frame| {
            edges
                .windows(2)
                .map(|edge| band_contrast(frame, freqs, edge[0], edge[1]))
                .collect()
        })
        .collect()
}

// Band edges 0, fmin, 2*fmin, ... capped at Nyquist.
fn contrast_edges(sample_rate: u32) -> Vec<f64> {
    let nyquist = sample_rate as f64 / 2.0;
    let mut edges = vec![0.0];
    for band in 0..=CONTRAST_BANDS {
        edges.push((CONTRAST_FMIN * 2.0_f64.powi(band as i32)).min(nyquist));
    }
    edges
}

fn band_contrast(frame: &[f64], freqs: &[f64], low: f64, high: f64) -> f32 {
    let mut band: Vec<f64> = frame
        .iter()
        .zip(freqs.iter())
        .filter(|(_, &f)| f >= low && f < high)
        .map(|(&p, _)| p.max(0.0))
        .collect();
    if band.is_empty() {
        return 0.0;
    }
    band.sort_by(|a, b| a.total_cmp(b));
    let take = ((band.len() as f64 * CONTRAST_QUANTILE).ceil() as usize).clamp(1, band.len());
    let valley: f64 = band[..take].iter().sum::<f64>() / take as f64;
    let peak: f64 = band[band.len() - take..].iter().sum::<f64>() / take as f64;
    (10.0 * ((peak + EPSILON) / (valley + EPSILON)).log10()) as f32
}

/// Order-1 least-squares fit of magnitude against frequency; frame-major
/// rows of [slope, intercept].
pub(crate) fn poly(magnitude: &[Vec<f64>], freqs: &[f64]) -> Vec<Vec<f32>> {
    let n = freqs.len() as f64;
    let mean_f: f64 = freqs.iter().sum::<f64>() / n.max(1.0);
    let var_f: f64 = freqs.iter().map(|f| (f - mean_f) * (f - mean_f)).sum::<f64>();
    magnitude
        .iter()
        .map(|frame| {
            if frame.is_empty() || var_f <= 0.0 {
                return vec![0.0, 0.0];
            }
            let mean_m: f64 = frame.iter().sum::<f64>() / frame.len() as f64;
            let cov: f64 = frame
                .iter()
                .zip(freqs.iter())
                .map(|(&m, &f)| (f - mean_f) * (m - mean_m))
                .sum();
            let slope = cov / var_f;
            let intercept = mean_m - slope * mean_f;
            vec![slope as f32, intercept as f32]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_bin_frame(bins: usize, hot: usize) -> Vec<Vec<f64>> {
        let mut frame = vec![0.0; bins];
        frame[hot] = 1.0;
        vec![frame]
    }

    fn linear_freqs(bins: usize, step: f64) -> Vec<f64> {
        (0..bins).map(|i| i as f64 * step).collect()
    }

    #[test]
    fn centroid_of_single_bin_is_that_bin_frequency() {
        let power = single_bin_frame(100, 40);
        let freqs = linear_freqs(100, 10.0);
        let values = centroid(&power, &freqs);
        assert!((values[0] - 400.0).abs() < 1e-3);
    }

    #[test]
    fn bandwidth_of_single_bin_is_zero() {
        let power = single_bin_frame(100, 40);
        let freqs = linear_freqs(100, 10.0);
        let centers = centroid(&power, &freqs);
        let values = bandwidth(&power, &freqs, &centers);
        assert!(values[0].abs() < 1e-3);
    }

    #[test]
    fn rolloff_of_single_bin_lands_on_it() {
        let power = single_bin_frame(100, 40);
        let freqs = linear_freqs(100, 10.0);
        let values = rolloff(&power, &freqs, 2000);
        assert!((values[0] - 400.0).abs() < 1e-3);
    }

    #[test]
    fn flatness_of_uniform_spectrum_is_one() {
        let power = vec![vec![1.0; 64]];
        let values = flatness(&power);
        assert!((values[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn flatness_of_peaky_spectrum_is_small() {
        let power = single_bin_frame(64, 10);
        let values = flatness(&power);
        assert!(values[0] < 0.1);
    }

    #[test]
    fn contrast_rows_have_expected_band_count() {
        let power = vec![vec![1.0; 1025]];
        let freqs = linear_freqs(1025, 22050.0 / 2048.0);
        let rows = contrast(&power, &freqs, 22050);
        assert_eq!(rows[0].len(), CONTRAST_BANDS + 1);
    }

    #[test]
    fn poly_fits_a_linear_spectrum() {
        let freqs = linear_freqs(100, 1.0);
        let magnitude = vec![freqs.iter().map(|f| 2.0 * f + 3.0).collect::<Vec<f64>>()];
        let rows = poly(&magnitude, &freqs);
        assert!((rows[0][0] - 2.0).abs() < 1e-4);
        assert!((rows[0][1] - 3.0).abs() < 1e-3);
    }
}
