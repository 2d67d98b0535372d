pub mod channel;

pub use channel::{result_channel, ResultPublisher};

use crate::core::{ChannelId, PhasorResult};
use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, TryRecvError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Idle wait between polls of an empty result queue.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Transmission-side consumer of phasor results.
#[async_trait]
pub trait ResultSink: Send {
    async fn deliver(&mut self, result: PhasorResult) -> Result<()>;
}

/// Logs every result; a stand-in for a network or serial transmitter.
#[derive(Debug, Default)]
pub struct TracingSink {
    delivered: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[async_trait]
impl ResultSink for TracingSink {
    async fn deliver(&mut self, result: PhasorResult) -> Result<()> {
        let ua = result.estimate(ChannelId::Ua);
        let ia = result.estimate(ChannelId::Ia);
        info!(
            frame = result.frame_index,
            timestamp_us = result.timestamp_us,
            valid = result.valid_count(),
            ua_freq = ua.frequency,
            ua_amp = ua.amplitude,
            ua_phase = ua.phase,
            ia_amp = ia.amplitude,
            rocof = ua.rocof,
            "Phasor result"
        );
        self.delivered += 1;
        Ok(())
    }
}

/// Drain the result queue into `sink` on the tokio runtime.
///
/// Ends when the producer side disconnects or a shutdown is broadcast,
/// after delivering what is already queued. Returns the delivered count.
pub fn spawn_sink_task<S>(
    rx: Receiver<PhasorResult>,
    mut sink: S,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<Result<u64>>
where
    S: ResultSink + 'static,
{
    tokio::spawn(async move {
        let mut delivered = 0u64;

        loop {
            if shutdown_rx.try_recv().is_ok() {
                debug!("Result sink shutting down");
                break;
            }

            match rx.try_recv() {
                Ok(result) => {
                    let frame_index = result.frame_index;
                    match sink.deliver(result).await {
                        Ok(()) => delivered += 1,
                        Err(e) => warn!(frame = frame_index, error = %e, "Result delivery failed"),
                    }
                }
                Err(TryRecvError::Empty) => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("Result queue disconnected");
                    return Ok(delivered);
                }
            }
        }

        for result in rx.try_iter() {
            if sink.deliver(result).await.is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    })
}
