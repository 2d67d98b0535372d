use super::acquisition::{AcquisitionHandoff, DmaBuffer};

/// Trait implemented by the timer-triggered, DMA-backed converter front end.
///
/// The pipeline only reads regions through `buffer()` and toggles the
/// trigger; peripheral setup stays behind the implementation.
pub trait SampleSource: Send + Sync {
    /// Read-only view of the two circular buffer regions
    fn buffer(&self) -> &DmaBuffer;

    /// Interrupt side of the signal queue, raised on each completed region
    fn handoff(&self) -> &AcquisitionHandoff;

    /// Enable the conversion trigger. Returns false if it was already enabled.
    fn start_sampling(&self) -> bool;

    /// Disable the conversion trigger. Returns false if it was already disabled.
    fn stop_sampling(&self) -> bool;

    fn is_sampling(&self) -> bool;
}
