pub mod config;
pub mod error;
pub mod frame;
pub mod phasor;

pub use config::{AlgorithmConfig, ConfigHandle, ConversionConfig, PipelineConfig};
pub use error::{PmuError, Result};
pub use frame::{ChannelId, ChannelSamples, Frame, RawSample, CHANNELS, FRAME_SIZE, FRAME_WORDS};
pub use phasor::{PhasorEstimate, PhasorResult};
