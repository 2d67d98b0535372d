pub mod phasor_engine;
pub mod pipeline;
pub mod state;
pub mod task;

pub use phasor_engine::PhasorEngine;
pub use pipeline::PhasorPipeline;
pub use state::PipelineState;
pub use task::{PhasorTask, TaskContext, TaskControl};
