use crate::core::{
    AlgorithmConfig, ChannelId, ChannelSamples, ConversionConfig, Frame, PhasorEstimate, PhasorResult,
    PipelineConfig, Result, CHANNELS, FRAME_SIZE,
};
use crate::dsp::{validate, BinSearch, ChannelHistory, SpectralEstimator};
use crate::hal::convert_frame;
use tracing::trace;

/// Per-frame estimation chain: conversion, spectral estimate, tracking and
/// validation for all channels.
///
/// Everything the chain touches is allocated in `new`; `process_frame` only
/// reuses it.
pub struct PhasorEngine {
    estimator: SpectralEstimator,
    histories: [ChannelHistory; CHANNELS],
    samples: Box<ChannelSamples>,
    conversion: ConversionConfig,
    frame_period: f64,
    frames_emitted: u64,
}

impl PhasorEngine {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let estimator = SpectralEstimator::new(config.fft_size, config.sample_rate_hz)?;

        Ok(Self {
            estimator,
            histories: [ChannelHistory::new(config.algorithm.nominal_frequency); CHANNELS],
            samples: Box::new([[0.0; FRAME_SIZE]; CHANNELS]),
            conversion: config.conversion,
            frame_period: config.frame_duration(),
            frames_emitted: 0,
        })
    }

    pub fn history(&self, channel: ChannelId) -> &ChannelHistory {
        &self.histories[channel.index()]
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn process_frame(&mut self, frame: &Frame, config: &AlgorithmConfig, timestamp_us: u64) -> PhasorResult {
        convert_frame(frame, &self.conversion, &mut self.samples);

        let mut estimates = [PhasorEstimate::default(); CHANNELS];
        for channel in ChannelId::ALL {
            let ch = channel.index();
            let history = &mut self.histories[ch];

            let search = if history.in_cold_start(config) {
                BinSearch::Full
            } else {
                BinSearch::Tracked(history.previous_frequency)
            };
            let spectral = self
                .estimator
                .estimate(&self.samples[ch], search, config.window_energy_correction);
            let tracked = history.advance(spectral.frequency, spectral.phase, self.frame_period, config);

            let mut estimate = PhasorEstimate {
                frequency: tracked.frequency,
                amplitude: spectral.amplitude,
                phase: spectral.phase,
                rocof: tracked.rocof,
                valid: true,
            };
            if let Err(rejection) = validate(&estimate, config) {
                trace!(channel = channel.name(), bin = spectral.bin, %rejection, "Estimate rejected");
                estimate.valid = false;
            }
            estimates[ch] = estimate;
        }

        self.frames_emitted += 1;
        PhasorResult {
            frame_index: self.frames_emitted,
            timestamp_us,
            estimates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{raw_to_volts, volts_to_raw};
    use std::f64::consts::PI;

    fn frame_of(frequency: f64, start: usize, volts_peak: f64) -> Frame {
        let mut frame = Frame::new();
        for n in 0..FRAME_SIZE {
            let t = (start + n) as f64 / 10_000.0;
            let code = volts_to_raw(1.65 + volts_peak * (2.0 * PI * frequency * t).sin());
            for ch in 0..CHANNELS {
                frame.set_sample(n, ch, code);
            }
        }
        frame
    }

    #[test]
    fn test_rejects_bad_transform_size() {
        let config = PipelineConfig {
            fft_size: 100,
            ..Default::default()
        };
        assert!(PhasorEngine::new(&config).is_err());
    }

    #[test]
    fn test_frame_index_starts_at_one() {
        let mut engine = PhasorEngine::new(&PipelineConfig::default()).unwrap();
        let config = AlgorithmConfig::default();

        for i in 0..3 {
            let result = engine.process_frame(&frame_of(50.0, i * FRAME_SIZE, 1.0), &config, i as u64);
            assert_eq!(result.frame_index, i as u64 + 1);
            assert_eq!(result.timestamp_us, i as u64);
        }
        assert_eq!(engine.frames_emitted(), 3);
    }

    #[test]
    fn test_history_advances_even_when_invalid() {
        // Offset equal to the flat code: converted samples are exactly zero
        let pipeline = PipelineConfig {
            conversion: ConversionConfig {
                voltage_offset: raw_to_volts(2048),
                current_offset: raw_to_volts(2048),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut engine = PhasorEngine::new(&pipeline).unwrap();
        let config = AlgorithmConfig::default();

        let mut flat = Frame::new();
        flat.as_mut_slice().fill(2048);
        let result = engine.process_frame(&flat, &config, 0);

        assert_eq!(result.valid_count(), 0);
        assert_eq!(engine.history(ChannelId::Ua).frames_tracked, 1);
    }

    #[test]
    fn test_cold_start_finds_off_nominal_tone() {
        let mut engine = PhasorEngine::new(&PipelineConfig::default()).unwrap();
        let config = AlgorithmConfig::default();

        let result = engine.process_frame(&frame_of(1000.0, 0, 1.0), &config, 0);
        let tracked = engine.history(ChannelId::Ia).previous_frequency;

        // Fused with the phase term, but anchored near the 1 kHz bin, not 50 Hz
        assert!(tracked > 500.0);
        assert!(!result.estimate(ChannelId::Ua).valid);
    }
}
