pub mod spectral;
pub mod tracker;
pub mod validator;
pub mod window;

pub use spectral::{parabolic_offset, BinSearch, SpectralEstimate, SpectralEstimator};
pub use tracker::{fuse_frequency, unwrap_phase_step, ChannelHistory, TrackedFrequency};
pub use validator::{validate, Rejection, AMPLITUDE_CEILING, ROCOF_CEILING};
pub use window::hann_window;
