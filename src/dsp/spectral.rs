use super::window::hann_window;
use crate::core::{PmuError, Result, FRAME_SIZE};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Lowest bin the tracker may lock onto; keeps k0-1 clear of DC.
pub const MIN_TRACKED_BIN: usize = 2;

/// How the estimator picks the bin it interpolates around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinSearch {
    /// Bin nearest the previous frequency estimate
    Tracked(f64),
    /// Largest magnitude inside the allowed bin range
    Full,
}

/// Raw output of one transform, before tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralEstimate {
    /// Parabolically interpolated frequency (Hz)
    pub frequency: f64,
    pub amplitude: f64,
    /// Phase of bin `bin`, in (-pi, pi]
    pub phase: f64,
    pub bin: usize,
}

/// Hann-windowed, zero-padded FFT with parabolic peak interpolation.
///
/// Plan, window, transform buffer and scratch are built once in `new`;
/// `estimate` performs no heap allocation.
pub struct SpectralEstimator {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    fft_size: usize,
    bin_resolution: f64,
    max_bin: usize,
}

impl SpectralEstimator {
    pub fn new(fft_size: usize, sample_rate_hz: f64) -> Result<Self> {
        if !fft_size.is_power_of_two() {
            return Err(PmuError::TransformPlan {
                size: fft_size,
                reason: "size must be a power of two".to_string(),
            });
        }
        if fft_size < FRAME_SIZE {
            return Err(PmuError::TransformPlan {
                size: fft_size,
                reason: format!("size must cover one frame of {} samples", FRAME_SIZE),
            });
        }
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(PmuError::InvalidGeometry(format!(
                "sample_rate_hz must be positive, got {}",
                sample_rate_hz
            )));
        }

        let max_bin = (fft_size / 2).saturating_sub(3);
        if max_bin < MIN_TRACKED_BIN {
            return Err(PmuError::TransformPlan {
                size: fft_size,
                reason: "no trackable bins".to_string(),
            });
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            window: hann_window(FRAME_SIZE),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            fft_size,
            bin_resolution: sample_rate_hz / fft_size as f64,
            max_bin,
        })
    }

    pub fn bin_resolution(&self) -> f64 {
        self.bin_resolution
    }

    /// Inclusive range of bins the estimator may select.
    pub fn bin_range(&self) -> (usize, usize) {
        (MIN_TRACKED_BIN, self.max_bin)
    }

    /// Bin nearest `frequency`, clamped into `bin_range`.
    pub fn tracked_bin(&self, frequency: f64) -> usize {
        let k = (frequency / self.bin_resolution).round();
        if !k.is_finite() || k <= MIN_TRACKED_BIN as f64 {
            return MIN_TRACKED_BIN;
        }
        (k as usize).min(self.max_bin)
    }

    pub fn estimate(
        &mut self,
        samples: &[f64; FRAME_SIZE],
        search: BinSearch,
        energy_correction: f64,
    ) -> SpectralEstimate {
        for (slot, (&x, &w)) in self.buffer.iter_mut().zip(samples.iter().zip(&self.window)) {
            *slot = Complex::new(x * w, 0.0);
        }
        for slot in self.buffer[FRAME_SIZE..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Single-sided amplitude normalisation
        let norm = 2.0 / FRAME_SIZE as f64;
        for bin in self.buffer[..=self.fft_size / 2].iter_mut() {
            *bin *= norm;
        }

        let k0 = match search {
            BinSearch::Tracked(previous) => self.tracked_bin(previous),
            BinSearch::Full => self.peak_bin(),
        };

        let left = self.buffer[k0 - 1].norm();
        let centre = self.buffer[k0].norm();
        let right = self.buffer[k0 + 1].norm();
        let delta = parabolic_offset(left, centre, right);

        let peak = self.buffer[k0];
        SpectralEstimate {
            frequency: (k0 as f64 + delta) * self.bin_resolution,
            amplitude: peak.norm() * energy_correction,
            phase: peak.im.atan2(peak.re),
            bin: k0,
        }
    }

    fn peak_bin(&self) -> usize {
        let mut best = MIN_TRACKED_BIN;
        let mut best_magnitude = f64::NEG_INFINITY;
        for k in MIN_TRACKED_BIN..=self.max_bin {
            let magnitude = self.buffer[k].norm_sqr();
            if magnitude > best_magnitude {
                best = k;
                best_magnitude = magnitude;
            }
        }
        best
    }
}

/// Vertex offset of the parabola through three equally spaced magnitudes,
/// in bins relative to the centre one. Zero when the points are collinear.
pub fn parabolic_offset(left: f64, centre: f64, right: f64) -> f64 {
    let denominator = left - 2.0 * centre + right;
    if denominator.abs() < 1e-12 {
        return 0.0;
    }
    0.5 * (left - right) / denominator
}
