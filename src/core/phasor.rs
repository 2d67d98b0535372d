use super::frame::{ChannelId, CHANNELS};
use serde::{Deserialize, Serialize};

/// Estimate for one channel in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasorEstimate {
    /// Fused frequency (Hz)
    pub frequency: f64,

    /// Window-corrected amplitude (engineering units)
    pub amplitude: f64,

    /// Phase angle of the tracked bin, wrapped to (-pi, pi]
    pub phase: f64,

    /// Rate of change of frequency (Hz/s)
    pub rocof: f64,

    /// Cleared when the estimate violates a plausibility bound
    pub valid: bool,
}

impl Default for PhasorEstimate {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            amplitude: 0.0,
            phase: 0.0,
            rocof: 0.0,
            valid: false,
        }
    }
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasorResult {
    /// Starts at 1 and increases by one per accepted frame
    pub frame_index: u64,

    /// Microseconds since the pipeline was configured, taken at frame completion
    pub timestamp_us: u64,

    pub estimates: [PhasorEstimate; CHANNELS],
}

impl PhasorResult {
    pub fn estimate(&self, channel: ChannelId) -> &PhasorEstimate {
        &self.estimates[channel.index()]
    }

    pub fn all_valid(&self) -> bool {
        self.estimates.iter().all(|e| e.valid)
    }

    pub fn valid_count(&self) -> usize {
        self.estimates.iter().filter(|e| e.valid).count()
    }
}
