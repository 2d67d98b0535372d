use super::StatisticsSnapshot;
use std::time::{Duration, Instant};

/// Formats periodic statistics reports for the operator log.
pub struct PipelineMonitor {
    started: Instant,
    frame_budget: Duration,
}

impl PipelineMonitor {
    /// `frame_budget` is the acquisition period one frame must fit into.
    pub fn new(frame_budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            frame_budget,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn generate_report(&self, snapshot: &StatisticsSnapshot) -> String {
        let uptime = self.uptime().as_secs_f64();
        let rate = if uptime > 0.0 {
            snapshot.frames_processed as f64 / uptime
        } else {
            0.0
        };
        let budget_us = self.frame_budget.as_micros() as u64;
        let load = if budget_us > 0 {
            100.0 * snapshot.avg_process_time_us as f64 / budget_us as f64
        } else {
            0.0
        };

        let mut report = String::from("=== Phasor Pipeline Statistics ===\n");
        report.push_str(&format!(
            "  Uptime: {:.1}s\n  Frames: {} processed ({:.1} frames/s)\n",
            uptime, snapshot.frames_processed, rate
        ));
        report.push_str(&format!(
            "  Process time: avg {}μs, max {}μs (budget {}μs, {:.1}% load)\n",
            snapshot.avg_process_time_us, snapshot.max_process_time_us, budget_us, load
        ));
        report.push_str(&format!(
            "  Dropped: {} results, {} signals\n",
            snapshot.results_dropped, snapshot.signals_dropped
        ));

        if snapshot.max_process_time_us > budget_us {
            report.push_str("  WARNING: frame processing exceeded the acquisition period\n");
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_contents() {
        let monitor = PipelineMonitor::new(Duration::from_millis(20));
        let snapshot = StatisticsSnapshot {
            frames_processed: 500,
            avg_process_time_us: 150,
            max_process_time_us: 900,
            results_dropped: 2,
            signals_dropped: 0,
        };

        let report = monitor.generate_report(&snapshot);
        assert!(report.contains("500 processed"));
        assert!(report.contains("avg 150μs, max 900μs"));
        assert!(report.contains("budget 20000μs"));
        assert!(report.contains("2 results, 0 signals"));
        assert!(!report.contains("WARNING"));
    }

    #[test]
    fn test_overrun_warning() {
        let monitor = PipelineMonitor::new(Duration::from_millis(20));
        let snapshot = StatisticsSnapshot {
            frames_processed: 1,
            avg_process_time_us: 25_000,
            max_process_time_us: 25_000,
            ..Default::default()
        };

        assert!(monitor.generate_report(&snapshot).contains("WARNING"));
    }
}
