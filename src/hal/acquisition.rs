use super::types::BufferHalf;
use crate::core::config::MIN_HANDOFF_CAPACITY;
use crate::core::{Frame, PmuError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Circular acquisition buffer split into two frame-sized regions.
///
/// The producer writes a region only through `write_half`, which waits for
/// readers of that region to finish, so a handed-off frame is never torn.
pub struct DmaBuffer {
    halves: [RwLock<Frame>; 2],
}

impl DmaBuffer {
    pub fn new() -> Self {
        Self {
            halves: [RwLock::new(Frame::new()), RwLock::new(Frame::new())],
        }
    }

    /// Stable view of one region; held for the duration of one frame's processing.
    pub fn half(&self, half: BufferHalf) -> RwLockReadGuard<'_, Frame> {
        self.halves[half.index()]
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write_half<R>(&self, half: BufferHalf, fill: impl FnOnce(&mut Frame) -> R) -> R {
        let mut frame = self.halves[half.index()]
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fill(&mut frame)
    }
}

impl Default for DmaBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the bounded interrupt-to-task signal queue.
pub fn handoff_channel(capacity: usize) -> Result<(Sender<BufferHalf>, Receiver<BufferHalf>)> {
    if capacity < MIN_HANDOFF_CAPACITY {
        return Err(PmuError::QueueCapacity {
            name: "handoff",
            min: MIN_HANDOFF_CAPACITY,
            requested: capacity,
        });
    }
    Ok(bounded(capacity))
}

/// Interrupt side of the hand-off. Every method is non-blocking and
/// allocation-free; a signal that cannot be queued is counted and dropped.
pub struct AcquisitionHandoff {
    tx: OnceLock<Sender<BufferHalf>>,
    signals_sent: AtomicU64,
    signals_dropped: AtomicU64,
}

impl AcquisitionHandoff {
    pub fn new() -> Self {
        Self {
            tx: OnceLock::new(),
            signals_sent: AtomicU64::new(0),
            signals_dropped: AtomicU64::new(0),
        }
    }

    /// Connect the signal queue. Returns false if one is already attached.
    pub fn attach(&self, tx: Sender<BufferHalf>) -> bool {
        self.tx.set(tx).is_ok()
    }

    pub fn is_attached(&self) -> bool {
        self.tx.get().is_some()
    }

    /// Half-transfer event: first region complete.
    pub fn on_half_transfer(&self) -> bool {
        self.signal(BufferHalf::First)
    }

    /// Transfer-complete event: second region complete.
    pub fn on_full_transfer(&self) -> bool {
        self.signal(BufferHalf::Second)
    }

    pub fn signals_sent(&self) -> u64 {
        self.signals_sent.load(Ordering::Relaxed)
    }

    pub fn signals_dropped(&self) -> u64 {
        self.signals_dropped.load(Ordering::Relaxed)
    }

    fn signal(&self, half: BufferHalf) -> bool {
        // Queue not constructed yet: startup ordering, discard silently
        let Some(tx) = self.tx.get() else {
            return false;
        };

        match tx.try_send(half) {
            Ok(()) => {
                self.signals_sent.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.signals_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

impl Default for AcquisitionHandoff {
    fn default() -> Self {
        Self::new()
    }
}
