use crate::core::AlgorithmConfig;
use std::f64::consts::PI;

/// Bring one phase step into (-pi, pi] with a single 2 pi correction.
pub fn unwrap_phase_step(dphase: f64) -> f64 {
    if dphase > PI {
        dphase - 2.0 * PI
    } else if dphase <= -PI {
        dphase + 2.0 * PI
    } else {
        dphase
    }
}

/// Weighted blend of the interpolated and phase-difference estimates.
pub fn fuse_frequency(interpolated: f64, from_phase: f64, alpha: f64) -> f64 {
    alpha * interpolated + (1.0 - alpha) * from_phase
}

/// Output of one tracking step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedFrequency {
    pub frequency: f64,
    pub rocof: f64,
}

/// Per-channel state carried from frame to frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelHistory {
    pub previous_frequency: f64,
    pub previous_phase: f64,
    /// Frames this channel has been through since configuration
    pub frames_tracked: u64,
}

impl ChannelHistory {
    pub fn new(nominal_frequency: f64) -> Self {
        Self {
            previous_frequency: nominal_frequency,
            previous_phase: 0.0,
            frames_tracked: 0,
        }
    }

    /// True while the bin should come from a full-spectrum search.
    pub fn in_cold_start(&self, config: &AlgorithmConfig) -> bool {
        self.frames_tracked < config.cold_start_search_frames as u64
    }

    /// Fuse the new interpolated frequency and phase with the history,
    /// then commit them as the next frame's history.
    pub fn advance(
        &mut self,
        interpolated_frequency: f64,
        phase: f64,
        frame_period: f64,
        config: &AlgorithmConfig,
    ) -> TrackedFrequency {
        let mut dphase = phase - self.previous_phase;
        if config.enable_phase_unwrap {
            dphase = unwrap_phase_step(dphase);
        }

        let from_phase = self.previous_frequency + dphase / (2.0 * PI * frame_period);
        let frequency = fuse_frequency(interpolated_frequency, from_phase, config.tracking_alpha);
        let rocof = (frequency - self.previous_frequency) / frame_period;

        self.previous_phase = phase;
        self.previous_frequency = frequency;
        self.frames_tracked += 1;

        TrackedFrequency { frequency, rocof }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_boundaries() {
        assert_eq!(unwrap_phase_step(PI), PI);
        assert!((unwrap_phase_step(-PI) - PI).abs() < 1e-15);
        assert!((unwrap_phase_step(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert!((unwrap_phase_step(-PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
        assert_eq!(unwrap_phase_step(0.5), 0.5);
    }

    #[test]
    fn test_fuse_extremes() {
        assert_eq!(fuse_frequency(51.0, 49.0, 1.0), 51.0);
        assert_eq!(fuse_frequency(51.0, 49.0, 0.0), 49.0);
        assert!((fuse_frequency(51.0, 49.0, 0.6) - 50.2).abs() < 1e-12);
    }

    #[test]
    fn test_steady_phase_holds_frequency() {
        let config = AlgorithmConfig::default();
        let mut history = ChannelHistory::new(50.0);
        history.previous_phase = 1.0;

        let tracked = history.advance(50.0, 1.0, 0.02, &config);
        assert!((tracked.frequency - 50.0).abs() < 1e-12);
        assert!(tracked.rocof.abs() < 1e-9);
        assert_eq!(history.frames_tracked, 1);
    }

    #[test]
    fn test_history_updated_after_step() {
        let config = AlgorithmConfig::default();
        let mut history = ChannelHistory::new(50.0);

        // 0.02 s frame, 0.01 rad advance -> +0.0796 Hz from phase
        let tracked = history.advance(50.5, 0.01, 0.02, &config);
        let from_phase = 50.0 + 0.01 / (2.0 * PI * 0.02);
        let expected = 0.6 * 50.5 + 0.4 * from_phase;

        assert!((tracked.frequency - expected).abs() < 1e-12);
        assert!((tracked.rocof - (expected - 50.0) / 0.02).abs() < 1e-9);
        assert_eq!(history.previous_frequency, tracked.frequency);
        assert_eq!(history.previous_phase, 0.01);
    }

    #[test]
    fn test_unwrap_disabled_keeps_raw_step() {
        let config = AlgorithmConfig {
            enable_phase_unwrap: false,
            tracking_alpha: 0.0,
            ..Default::default()
        };
        let mut history = ChannelHistory::new(50.0);
        history.previous_phase = -3.0;

        let tracked = history.advance(50.0, 3.0, 0.02, &config);
        let expected = 50.0 + 6.0 / (2.0 * PI * 0.02);
        assert!((tracked.frequency - expected).abs() < 1e-9);
    }

    #[test]
    fn test_cold_start_window() {
        let config = AlgorithmConfig {
            cold_start_search_frames: 2,
            ..Default::default()
        };
        let mut history = ChannelHistory::new(50.0);

        assert!(history.in_cold_start(&config));
        history.advance(50.0, 0.0, 0.02, &config);
        assert!(history.in_cold_start(&config));
        history.advance(50.0, 0.0, 0.02, &config);
        assert!(!history.in_cold_start(&config));
    }
}
