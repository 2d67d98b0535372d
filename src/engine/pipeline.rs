use super::phasor_engine::PhasorEngine;
use super::state::PipelineState;
use super::task::{PhasorTask, TaskContext};
use crate::core::{ConfigHandle, PipelineConfig, PmuError, Result};
use crate::hal::{handoff_channel, SampleSource};
use crate::observability::{PipelineMetrics, StatisticsSnapshot};
use crate::sink::ResultPublisher;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle owner of the phasor estimation chain.
///
/// `Uninitialized -> Configured -> Running <-> Stopped`. There is no way
/// back to `Uninitialized`; dropping the pipeline stops its thread.
pub struct PhasorPipeline {
    config: PipelineConfig,
    state: PipelineState,
    algorithm: ConfigHandle,
    metrics: Arc<PipelineMetrics>,
    source: Option<Arc<dyn SampleSource>>,
    publisher: Option<ResultPublisher>,
    task: Option<PhasorTask>,
}

impl PhasorPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let algorithm = ConfigHandle::new(config.algorithm);
        Self {
            config,
            state: PipelineState::Uninitialized,
            algorithm,
            metrics: Arc::new(PipelineMetrics::new()),
            source: None,
            publisher: None,
            task: None,
        }
    }

    /// Get current pipeline state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Live algorithm configuration; replacements apply from the next frame.
    pub fn config(&self) -> &ConfigHandle {
        &self.algorithm
    }

    /// Transition to a new state with validation
    fn transition_to(&mut self, new_state: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(PmuError::InvalidTransition {
                from: self.state.name(),
                to: new_state.name(),
            });
        }
        debug!(from = self.state.name(), to = new_state.name(), "Pipeline state change");
        self.state = new_state;
        Ok(())
    }

    /// Follow a command the task was handed. One that was delivered but not
    /// acknowledged in time still takes effect in the task, so the state
    /// moves anyway and the error is reported.
    fn follow_task(&mut self, outcome: Result<()>, target: PipelineState) -> Result<()> {
        match outcome {
            Ok(()) => self.transition_to(target),
            Err(e @ PmuError::TaskUnresponsive(_)) => {
                self.transition_to(target)?;
                warn!(state = target.name(), error = %e, "Computation task is lagging behind control");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// One-time setup: transform plan, window and histories, hand-off
    /// queue, and the parked computation thread.
    pub fn configure(&mut self, source: Arc<dyn SampleSource>, publisher: ResultPublisher) -> Result<()> {
        if !self.state.can_transition_to(&PipelineState::Configured) {
            return Err(PmuError::InvalidTransition {
                from: self.state.name(),
                to: PipelineState::Configured.name(),
            });
        }

        let engine = PhasorEngine::new(&self.config)?;

        let (handoff_tx, handoff_rx) = handoff_channel(self.config.handoff_capacity)?;
        if !source.handoff().attach(handoff_tx) {
            return Err(PmuError::InvalidConfig(
                "sample source already feeds another hand-off queue".to_string(),
            ));
        }

        let context = TaskContext {
            source: Arc::clone(&source),
            handoff_rx,
            publisher: publisher.clone(),
            config: self.algorithm.clone(),
            metrics: Arc::clone(&self.metrics),
            epoch: Instant::now(),
        };
        let task = PhasorTask::spawn(engine, context)?;

        self.source = Some(source);
        self.publisher = Some(publisher);
        self.task = Some(task);
        self.transition_to(PipelineState::Configured)?;

        info!(
            sample_rate_hz = self.config.sample_rate_hz,
            fft_size = self.config.fft_size,
            bin_resolution = self.config.bin_resolution(),
            nominal_frequency = self.config.algorithm.nominal_frequency,
            "Phasor pipeline configured"
        );
        Ok(())
    }

    /// Enable acquisition on first start, then let the task consume frames.
    pub fn start(&mut self) -> Result<()> {
        if !self.state.can_transition_to(&PipelineState::Running) {
            return Err(PmuError::InvalidTransition {
                from: self.state.name(),
                to: PipelineState::Running.name(),
            });
        }
        let task = self.task.as_ref().ok_or(PmuError::NotConfigured)?;

        if self.state == PipelineState::Configured {
            if let Some(source) = &self.source {
                source.start_sampling();
            }
        }
        let outcome = task.resume();

        self.follow_task(outcome, PipelineState::Running)?;
        info!("Phasor pipeline running");
        Ok(())
    }

    /// Suspend the computation task. Acquisition is left alone.
    pub fn stop(&mut self) -> Result<()> {
        if !self.state.can_transition_to(&PipelineState::Stopped) {
            return Err(PmuError::InvalidTransition {
                from: self.state.name(),
                to: PipelineState::Stopped.name(),
            });
        }
        let task = self.task.as_ref().ok_or(PmuError::NotConfigured)?;
        let outcome = task.suspend();

        self.follow_task(outcome, PipelineState::Stopped)?;
        info!("Phasor pipeline stopped");
        Ok(())
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        let mut snapshot = self.metrics.snapshot();
        if let Some(publisher) = &self.publisher {
            snapshot.results_dropped = publisher.results_dropped();
        }
        if let Some(source) = &self.source {
            snapshot.signals_dropped = source.handoff().signals_dropped();
        }
        snapshot
    }
}

impl Drop for PhasorPipeline {
    fn drop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.shutdown();
        }
    }
}
