pub mod core;
pub mod dsp;
pub mod engine;
pub mod hal;
pub mod observability;
pub mod sink;
