//! Waveform-only descriptors, framed like the STFT but independent of
//! the sample rate.

/// Frame-wise root-mean-square energy.
pub(crate) fn rms(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    framed(samples, frame_size, hop_size, |frame| {
        if frame.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0_f64;
        for &sample in frame {
            let sample = sample as f64;
            sum += sample * sample;
        }
        (sum / frame.len() as f64).sqrt() as f32
    })
}

/// Frame-wise fraction of adjacent sample pairs whose signs differ.
pub(crate) fn zero_crossing_rate(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    framed(samples, frame_size, hop_size, |frame| {
        if frame.len() < 2 {
            return 0.0;
        }
        let mut crossings = 0usize;
        for pair in frame.windows(2) {
            let crossed = (pair[0] >= 0.0) != (pair[1] >= 0.0);
            if crossed {
                crossings += 1;
            }
        }
        crossings as f32 / frame.len() as f32
    })
}

fn framed<F: Fn(&[f32]) -> f32>(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    compute: F,
) -> Vec<f32> {
    let frame_size = frame_size.max(1);
    let hop_size = hop_size.max(1);
    let mut values = Vec::new();
    let mut start = 0usize;
    while start < samples.len() {
        let end = (start + frame_size).min(samples.len());
        values.push(compute(&samples[start..end]));
        start += hop_size;
    }
    values
}
