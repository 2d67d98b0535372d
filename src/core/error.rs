use thiserror::Error;

/// Failures that stop the pipeline from making progress. Per-estimate
/// plausibility problems are never reported here; they only clear
/// `PhasorEstimate::valid`.
#[derive(Debug, Error)]
pub enum PmuError {
    #[error("Invalid acquisition geometry: {0}")]
    InvalidGeometry(String),

    #[error("Cannot build a {size}-point transform plan: {reason}")]
    TransformPlan { size: usize, reason: String },

    #[error("Failed to spawn computation task: {0}")]
    TaskSpawn(#[source] std::io::Error),

    #[error("Computation task did not acknowledge {0}")]
    TaskUnresponsive(&'static str),

    #[error("Computation task has exited")]
    TaskExited,

    #[error("Queue '{name}' needs capacity >= {min}, got {requested}")]
    QueueCapacity {
        name: &'static str,
        min: usize,
        requested: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Pipeline has not been configured")]
    NotConfigured,

    #[error("Failed to read configuration file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PmuError>;
