use crate::core::config::MIN_RESULT_CAPACITY;
use crate::core::{PhasorResult, PmuError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Create the bounded result queue between the computation task and the
/// transmission side.
pub fn result_channel(capacity: usize) -> Result<(ResultPublisher, Receiver<PhasorResult>)> {
    if capacity < MIN_RESULT_CAPACITY {
        return Err(PmuError::QueueCapacity {
            name: "result",
            min: MIN_RESULT_CAPACITY,
            requested: capacity,
        });
    }

    let (tx, rx) = bounded(capacity);
    let publisher = ResultPublisher {
        tx,
        results_dropped: Arc::new(AtomicU64::new(0)),
    };
    Ok((publisher, rx))
}

/// Producer end of the result queue. Never blocks; clones share the
/// drop counter.
#[derive(Clone)]
pub struct ResultPublisher {
    tx: Sender<PhasorResult>,
    results_dropped: Arc<AtomicU64>,
}

impl ResultPublisher {
    /// Enqueue a result; a full or closed queue drops it.
    pub fn publish(&self, result: PhasorResult) -> bool {
        match self.tx.try_send(result) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.results_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn results_dropped(&self) -> u64 {
        self.results_dropped.load(Ordering::Relaxed)
    }
}
