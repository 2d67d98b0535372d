use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct FrameTiming {
    frames_processed: u64,
    total_process_us: u64,
    max_process_us: u64,
}

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub frames_processed: u64,
    pub avg_process_time_us: u64,
    pub max_process_time_us: u64,
    /// Results discarded because the result queue was full
    pub results_dropped: u64,
    /// Hand-off signals discarded because the signal queue was full
    pub signals_dropped: u64,
}

/// Per-frame timing written by the computation task and read by anyone.
pub struct PipelineMetrics {
    timing: Mutex<FrameTiming>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            timing: Mutex::new(FrameTiming::default()),
        }
    }

    pub fn record_frame(&self, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros() as u64;
        let mut timing = self
            .timing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        timing.frames_processed += 1;
        timing.total_process_us += elapsed_us;
        timing.max_process_us = timing.max_process_us.max(elapsed_us);
    }

    pub fn frames_processed(&self) -> u64 {
        self.timing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .frames_processed
    }

    /// Timing counters only; drop counts are owned by the queues.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let timing = self
            .timing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let avg_process_time_us = if timing.frames_processed == 0 {
            0
        } else {
            timing.total_process_us / timing.frames_processed
        };

        StatisticsSnapshot {
            frames_processed: timing.frames_processed,
            avg_process_time_us,
            max_process_time_us: timing.max_process_us,
            results_dropped: 0,
            signals_dropped: 0,
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot(), StatisticsSnapshot::default());
    }

    #[test]
    fn test_average_and_max() {
        let metrics = PipelineMetrics::new();
        metrics.record_frame(Duration::from_micros(100));
        metrics.record_frame(Duration::from_micros(300));
        metrics.record_frame(Duration::from_micros(200));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_processed, 3);
        assert_eq!(snapshot.avg_process_time_us, 200);
        assert_eq!(snapshot.max_process_time_us, 300);
        assert_eq!(metrics.frames_processed(), 3);
    }
}
