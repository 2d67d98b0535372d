use std::f64::consts::PI;

/// Symmetric Hann window: `0.5 * (1 - cos(2 pi n / (len - 1)))`.
pub fn hann_window(len: usize) -> Vec<f64> {
    if len < 2 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f64) / (len - 1) as f64).cos()))
        .collect()
}
