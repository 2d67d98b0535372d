pub mod metrics;
pub mod monitor;

pub use metrics::{PipelineMetrics, StatisticsSnapshot};
pub use monitor::PipelineMonitor;
