use super::error::{PmuError, Result};
use super::frame::FRAME_SIZE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Minimum depth of the interrupt-to-task signal queue.
pub const MIN_HANDOFF_CAPACITY: usize = 8;

/// Minimum depth of the result queue towards the transmission side.
pub const MIN_RESULT_CAPACITY: usize = 4;

/// Tunables of the estimator and tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Grid frequency the tracker starts from (Hz)
    pub nominal_frequency: f64,

    /// Weight of the interpolated estimate vs. the phase-difference estimate
    pub tracking_alpha: f64,

    /// Amplitude compensation for the window's coherent gain (2.0 for Hann)
    pub window_energy_correction: f64,

    pub enable_phase_unwrap: bool,

    /// Max deviation from nominal before an estimate is flagged (Hz)
    pub outlier_threshold: f64,

    /// Frames per channel during which the target bin is found by a
    /// full-spectrum peak search instead of the previous-frequency hint
    pub cold_start_search_frames: u32,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            nominal_frequency: 50.0,
            tracking_alpha: 0.6,
            window_energy_correction: 2.0,
            enable_phase_unwrap: true,
            outlier_threshold: 5.0,
            cold_start_search_frames: 1,
        }
    }
}

impl AlgorithmConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.nominal_frequency.is_finite() && self.nominal_frequency > 0.0) {
            return Err(PmuError::InvalidConfig(format!(
                "nominal_frequency must be positive, got {}",
                self.nominal_frequency
            )));
        }
        if !(0.0..=1.0).contains(&self.tracking_alpha) {
            return Err(PmuError::InvalidConfig(format!(
                "tracking_alpha must be within [0, 1], got {}",
                self.tracking_alpha
            )));
        }
        if !(self.window_energy_correction.is_finite() && self.window_energy_correction > 0.0) {
            return Err(PmuError::InvalidConfig(format!(
                "window_energy_correction must be positive, got {}",
                self.window_energy_correction
            )));
        }
        if !(self.outlier_threshold.is_finite() && self.outlier_threshold >= 0.0) {
            return Err(PmuError::InvalidConfig(format!(
                "outlier_threshold must be non-negative, got {}",
                self.outlier_threshold
            )));
        }
        Ok(())
    }
}

/// Mapping from ADC volts to engineering units, per channel class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub voltage_scaling: f64,
    pub current_scaling: f64,
    pub voltage_offset: f64,
    pub current_offset: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        // Front end biases both classes to mid-rail; scaling is board specific
        Self {
            voltage_scaling: 1.0,
            current_scaling: 1.0,
            voltage_offset: 1.65,
            current_offset: 1.65,
        }
    }
}

/// Complete pipeline description, usually parsed from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sample_rate_hz: f64,

    /// Transform length; power of two, at least `FRAME_SIZE`
    pub fft_size: usize,

    pub handoff_capacity: usize,
    pub result_capacity: usize,
    pub algorithm: AlgorithmConfig,
    pub conversion: ConversionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10_000.0,
            fft_size: 256,
            handoff_capacity: MIN_HANDOFF_CAPACITY,
            result_capacity: MIN_RESULT_CAPACITY,
            algorithm: AlgorithmConfig::default(),
            conversion: ConversionConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Loaded pipeline configuration");
        Ok(config)
    }

    /// Seconds covered by one frame.
    pub fn frame_duration(&self) -> f64 {
        FRAME_SIZE as f64 / self.sample_rate_hz
    }

    pub fn bin_resolution(&self) -> f64 {
        self.sample_rate_hz / self.fft_size as f64
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(PmuError::InvalidGeometry(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if self.handoff_capacity < MIN_HANDOFF_CAPACITY {
            return Err(PmuError::QueueCapacity {
                name: "handoff",
                min: MIN_HANDOFF_CAPACITY,
                requested: self.handoff_capacity,
            });
        }
        if self.result_capacity < MIN_RESULT_CAPACITY {
            return Err(PmuError::QueueCapacity {
                name: "result",
                min: MIN_RESULT_CAPACITY,
                requested: self.result_capacity,
            });
        }
        self.algorithm.validate()
    }
}

/// Shared, replaceable algorithm configuration. The computation task takes
/// one copy per frame, so a replacement is seen from the next frame on.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<Mutex<AlgorithmConfig>>,
}

impl ConfigHandle {
    pub fn new(config: AlgorithmConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    pub fn get(&self) -> AlgorithmConfig {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn replace(&self, config: AlgorithmConfig) -> Result<()> {
        config.validate()?;
        let mut current = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = config;
        debug!(?config, "Algorithm configuration replaced");
        Ok(())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(AlgorithmConfig::default())
    }
}
