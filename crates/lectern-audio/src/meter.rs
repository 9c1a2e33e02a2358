//! Input level meter.

/// Loudness of a segment: RMS amplitude normalized to `0.0..=1.0`.
///
/// A silent or empty segment reads 0; a full-scale square wave reads 1.
pub fn level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();
    let rms = (sum / samples.len() as f64).sqrt();
    (rms / f64::from(i16::MAX)).min(1.0) as f32
}
