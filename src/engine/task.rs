use super::phasor_engine::PhasorEngine;
use crate::core::{ConfigHandle, PmuError, Result};
use crate::hal::{BufferHalf, SampleSource};
use crate::observability::PipelineMetrics;
use crate::sink::ResultPublisher;
use crossbeam_channel::{select, unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// How long a control request waits for the task to acknowledge it.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    Suspend,
    Resume,
    Shutdown,
}

impl TaskControl {
    fn name(self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Everything the computation thread reads besides its engine.
pub struct TaskContext {
    pub source: Arc<dyn SampleSource>,
    pub handoff_rx: Receiver<BufferHalf>,
    pub publisher: ResultPublisher,
    pub config: ConfigHandle,
    pub metrics: Arc<PipelineMetrics>,
    /// Zero point of `PhasorResult::timestamp_us`
    pub epoch: Instant,
}

/// Handle to the single computation thread.
///
/// The thread starts suspended. While suspended it does not dequeue
/// hand-off signals; once a signal is dequeued its frame is processed to
/// completion.
///
/// Every request carries a sequence number and the task acknowledges that
/// number, so a late acknowledgement is never mistaken for a newer one.
pub struct PhasorTask {
    control_tx: Sender<(u64, TaskControl)>,
    ack_rx: Receiver<u64>,
    next_seq: AtomicU64,
    handle: Option<JoinHandle<()>>,
}

impl PhasorTask {
    pub fn spawn(engine: PhasorEngine, context: TaskContext) -> Result<Self> {
        let (control_tx, control_rx) = unbounded();
        let (ack_tx, ack_rx) = unbounded();

        let handle = std::thread::Builder::new()
            .name("phasor-task".to_string())
            .spawn(move || run(engine, context, control_rx, ack_tx))
            .map_err(PmuError::TaskSpawn)?;

        Ok(Self {
            control_tx,
            ack_rx,
            next_seq: AtomicU64::new(0),
            handle: Some(handle),
        })
    }

    pub fn suspend(&self) -> Result<()> {
        self.command(TaskControl::Suspend)
    }

    pub fn resume(&self) -> Result<()> {
        self.command(TaskControl::Resume)
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = self.command(TaskControl::Shutdown) {
            warn!(error = %e, "Computation task did not confirm shutdown");
        }
        if handle.join().is_err() {
            error!("Computation task panicked");
        }
    }

    /// Deliver a request and wait for its acknowledgement.
    ///
    /// `TaskUnresponsive` means the request was delivered and will still be
    /// applied once the task gets to it; `TaskExited` means it was not.
    fn command(&self, control: TaskControl) -> Result<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        for stale in self.ack_rx.try_iter() {
            trace!(seq = stale, "Discarding late acknowledgement");
        }

        self.control_tx
            .send((seq, control))
            .map_err(|_| PmuError::TaskExited)?;

        let deadline = Instant::now() + CONTROL_TIMEOUT;
        loop {
            match self.ack_rx.recv_deadline(deadline) {
                Ok(ack) if ack == seq => return Ok(()),
                Ok(stale) => trace!(seq = stale, "Discarding late acknowledgement"),
                Err(RecvTimeoutError::Timeout) => return Err(PmuError::TaskUnresponsive(control.name())),
                Err(RecvTimeoutError::Disconnected) => return Err(PmuError::TaskExited),
            }
        }
    }
}

impl Drop for PhasorTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum Event {
    Control(u64, TaskControl),
    Frame(BufferHalf),
    HandoffClosed,
}

fn run(
    mut engine: PhasorEngine,
    context: TaskContext,
    control_rx: Receiver<(u64, TaskControl)>,
    ack_tx: Sender<u64>,
) {
    let mut running = false;
    let mut handoff_open = true;
    debug!("Computation task parked");

    loop {
        // A dropped handle is treated as a shutdown request
        let event = if running && handoff_open {
            select! {
                recv(control_rx) -> msg => {
                    let (seq, control) = msg.unwrap_or((0, TaskControl::Shutdown));
                    Event::Control(seq, control)
                }
                recv(context.handoff_rx) -> msg => match msg {
                    Ok(half) => Event::Frame(half),
                    Err(_) => Event::HandoffClosed,
                },
            }
        } else {
            let (seq, control) = control_rx.recv().unwrap_or((0, TaskControl::Shutdown));
            Event::Control(seq, control)
        };

        match event {
            Event::Frame(half) => process(&mut engine, &context, half),
            Event::HandoffClosed => {
                warn!("Hand-off queue closed; waiting for control");
                handoff_open = false;
            }
            Event::Control(seq, control) => {
                match control {
                    TaskControl::Suspend => running = false,
                    TaskControl::Resume => running = true,
                    TaskControl::Shutdown => {
                        let _ = ack_tx.send(seq);
                        break;
                    }
                }
                debug!(running, seq, "Computation task {}", control.name());
                let _ = ack_tx.send(seq);
            }
        }
    }

    info!(frames = engine.frames_emitted(), "Computation task exited");
}

fn process(engine: &mut PhasorEngine, context: &TaskContext, half: BufferHalf) {
    let started = Instant::now();
    let timestamp_us = context.epoch.elapsed().as_micros() as u64;
    let config = context.config.get();

    let result = {
        let frame = context.source.buffer().half(half);
        engine.process_frame(&frame, &config, timestamp_us)
    };

    let frame_index = result.frame_index;
    if !context.publisher.publish(result) {
        let dropped = context.publisher.results_dropped();
        if dropped == 1 || dropped % 100 == 0 {
            warn!(frame = frame_index, dropped, "Result queue full, result dropped");
        } else {
            trace!(frame = frame_index, "Result dropped");
        }
    }

    context.metrics.record_frame(started.elapsed());
}
