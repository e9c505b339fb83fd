//! Mel-scale descriptors: mel spectrogram and MFCCs.

use aus::analysis;
use aus::analysis::mel::MelFilterbank;

pub(crate) const MEL_BANDS: usize = 128;
pub(crate) const MFCC_COUNT: usize = 20;
const MIN_FREQ: f64 = 20.0;

/// Frame-major mel power spectrogram (frames x 128 bands).
pub(crate) fn mel_spectrogram(
    power: &[Vec<f64>],
    freqs: &[f64],
    sample_rate: u32,
) -> Vec<Vec<f64>> {
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        sample_rate as f64 / 2.0,
        MEL_BANDS,
        freqs,
        true,
    );
    analysis::mel::make_mel_spectrogram(power, &filterbank)
}

/// Frame-major MFCCs (frames x 20 coefficients) from the mel spectrogram.
pub(crate) fn mfcc(mel_spectrogram: &[Vec<f64>]) -> Vec<Vec<f64>> {
    analysis::mel::mfcc_spectrogram(mel_spectrogram, MFCC_COUNT, None)
}
