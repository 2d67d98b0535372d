use serde::{Deserialize, Serialize};

/// Samples per channel in one frame.
pub const FRAME_SIZE: usize = 200;

/// Number of analog channels scanned per conversion sequence.
pub const CHANNELS: usize = 6;

/// Raw codes in one buffer half (one frame across all channels).
pub const FRAME_WORDS: usize = FRAME_SIZE * CHANNELS;

/// Native ADC code type (12-bit right aligned).
pub type RawSample = u16;

/// Channel-major physical samples, reused frame to frame.
pub type ChannelSamples = [[f64; FRAME_SIZE]; CHANNELS];

/// Scan order of the converter sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    Ua = 0,
    Ub = 1,
    Uc = 2,
    Ia = 3,
    Ib = 4,
    Ic = 5,
}

impl ChannelId {
    pub const ALL: [ChannelId; CHANNELS] = [
        ChannelId::Ua,
        ChannelId::Ub,
        ChannelId::Uc,
        ChannelId::Ia,
        ChannelId::Ib,
        ChannelId::Ic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Channels 0-2 carry phase voltages, 3-5 phase currents.
    pub fn is_voltage(self) -> bool {
        self.index() < 3
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ua => "UA",
            Self::Ub => "UB",
            Self::Uc => "UC",
            Self::Ia => "IA",
            Self::Ib => "IB",
            Self::Ic => "IC",
        }
    }
}

/// One half of the circular acquisition buffer: `FRAME_SIZE` scans of
/// `CHANNELS` codes, interleaved as `[n * CHANNELS + ch]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    words: [RawSample; FRAME_WORDS],
}

impl Frame {
    pub fn new() -> Self {
        Self {
            words: [0; FRAME_WORDS],
        }
    }

    pub fn as_slice(&self) -> &[RawSample] {
        &self.words
    }

    pub fn as_mut_slice(&mut self) -> &mut [RawSample] {
        &mut self.words
    }

    /// Code of channel `channel` at scan `n`.
    pub fn sample(&self, n: usize, channel: usize) -> RawSample {
        self.words[n * CHANNELS + channel]
    }

    pub fn set_sample(&mut self, n: usize, channel: usize, code: RawSample) {
        self.words[n * CHANNELS + channel] = code;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("words", &FRAME_WORDS)
            .field("head", &&self.words[..CHANNELS])
            .finish()
    }
}
