//! Shared STFT analysis for the descriptor catalog.

use aus::analysis;
use aus::spectrum;
use aus::WindowType;

/// 2048-point Hann window, 512-sample hop.
pub(crate) const FRAME_SIZE: usize = 2048;
pub(crate) const HOP_SIZE: usize = 512;

/// Frame-major spectrograms plus the bin center frequencies every
/// spectral descriptor reads from.
pub(crate) struct Spectra {
    pub magnitude: Vec<Vec<f64>>,
    pub power: Vec<Vec<f64>>,
    pub freqs: Vec<f64>,
}

pub(crate) fn analyze(samples: &[f32], sample_rate: u32) -> Spectra {
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let stft = spectrum::rstft(&audio, FRAME_SIZE, HOP_SIZE, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);
    let freqs = spectrum::rfftfreq(FRAME_SIZE, sample_rate);
    Spectra {
        magnitude,
        power,
        freqs,
    }
}
