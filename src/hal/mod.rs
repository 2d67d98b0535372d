pub mod acquisition;
pub mod converter;
pub mod mock;
pub mod traits;
pub mod types;

pub use acquisition::{handoff_channel, AcquisitionHandoff, DmaBuffer};
pub use converter::{convert_frame, raw_to_volts, volts_to_raw};
pub use traits::SampleSource;
pub use types::BufferHalf;
