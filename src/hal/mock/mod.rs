pub mod adc;

pub use adc::{SimulatedAdc, SimulatedWaveform};
