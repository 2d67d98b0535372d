use crate::core::{ChannelId, ConversionConfig, RawSample, CHANNELS, FRAME_SIZE};
use crate::hal::acquisition::{AcquisitionHandoff, DmaBuffer};
use crate::hal::converter::volts_to_raw;
use crate::hal::{BufferHalf, SampleSource};
use std::f64::consts::{PI, SQRT_2};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Signal synthesised on every channel, in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedWaveform {
    pub frequency: f64,
    pub voltage_peak: f64,
    pub current_peak: f64,
    /// Phase at sample 0, per channel (radians)
    pub phase_offsets: [f64; CHANNELS],
}

impl SimulatedWaveform {
    /// Same sine on every channel.
    pub fn single_phase(frequency: f64, voltage_peak: f64, current_peak: f64) -> Self {
        Self {
            frequency,
            voltage_peak,
            current_peak,
            phase_offsets: [0.0; CHANNELS],
        }
    }

    /// Balanced three-phase system, currents lagging by `current_lag`.
    pub fn three_phase(frequency: f64, voltage_rms: f64, current_rms: f64, current_lag: f64) -> Self {
        let step = 2.0 * PI / 3.0;
        Self {
            frequency,
            voltage_peak: voltage_rms * SQRT_2,
            current_peak: current_rms * SQRT_2,
            phase_offsets: [
                0.0,
                -step,
                step,
                -current_lag,
                -step - current_lag,
                step - current_lag,
            ],
        }
    }
}

impl Default for SimulatedWaveform {
    fn default() -> Self {
        Self::three_phase(50.0, 230.0, 5.0, 0.0)
    }
}

struct Cursor {
    next_half: BufferHalf,
    sample_index: u64,
}

/// Host stand-in for the timer-triggered scan converter with circular DMA.
///
/// `fill_next_half` performs one half-buffer worth of conversions and raises
/// the matching transfer event, which makes tests fully deterministic;
/// `spawn_free_running` paces it at the real frame period.
pub struct SimulatedAdc {
    buffer: DmaBuffer,
    handoff: AcquisitionHandoff,
    sampling: AtomicBool,
    shutdown: AtomicBool,
    sample_rate_hz: f64,
    conversion: ConversionConfig,
    waveform: Mutex<SimulatedWaveform>,
    cursor: Mutex<Cursor>,
    halves_filled: AtomicU64,
}

impl SimulatedAdc {
    pub fn new(sample_rate_hz: f64, conversion: ConversionConfig, waveform: SimulatedWaveform) -> Self {
        Self {
            buffer: DmaBuffer::new(),
            handoff: AcquisitionHandoff::new(),
            sampling: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            sample_rate_hz,
            conversion,
            waveform: Mutex::new(waveform),
            cursor: Mutex::new(Cursor {
                next_half: BufferHalf::First,
                sample_index: 0,
            }),
            halves_filled: AtomicU64::new(0),
        }
    }

    pub fn set_waveform(&self, waveform: SimulatedWaveform) {
        *self
            .waveform
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = waveform;
    }

    pub fn halves_filled(&self) -> u64 {
        self.halves_filled.load(Ordering::Relaxed)
    }

    /// Convert one frame into the next region and raise its transfer event.
    /// Does nothing while the trigger is disabled.
    pub fn fill_next_half(&self) -> Option<BufferHalf> {
        if !self.is_sampling() {
            return None;
        }

        let waveform = *self
            .waveform
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let half = cursor.next_half;
        let start = cursor.sample_index;

        self.buffer.write_half(half, |frame| {
            for n in 0..FRAME_SIZE {
                let index = start + n as u64;
                for channel in ChannelId::ALL {
                    frame.set_sample(n, channel.index(), self.code_for(&waveform, channel, index));
                }
            }
        });

        cursor.sample_index += FRAME_SIZE as u64;
        cursor.next_half = half.other();
        drop(cursor);

        self.halves_filled.fetch_add(1, Ordering::Relaxed);
        match half {
            BufferHalf::First => self.handoff.on_half_transfer(),
            BufferHalf::Second => self.handoff.on_full_transfer(),
        };

        Some(half)
    }

    /// Run the converter in real time on its own thread until `shutdown`.
    pub fn spawn_free_running(self: &Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        let adc = Arc::clone(self);
        let period = Duration::from_secs_f64(FRAME_SIZE as f64 / self.sample_rate_hz);

        std::thread::Builder::new()
            .name("adc-dma".to_string())
            .spawn(move || {
                info!(period_us = period.as_micros() as u64, "Simulated converter running");
                let mut deadline = Instant::now() + period;
                while !adc.shutdown.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if deadline > now {
                        std::thread::sleep(deadline - now);
                    }
                    deadline += period;
                    adc.fill_next_half();
                }
                debug!("Simulated converter stopped");
            })
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    fn code_for(&self, waveform: &SimulatedWaveform, channel: ChannelId, index: u64) -> RawSample {
        let (peak, offset, scaling) = if channel.is_voltage() {
            (
                waveform.voltage_peak,
                self.conversion.voltage_offset,
                self.conversion.voltage_scaling,
            )
        } else {
            (
                waveform.current_peak,
                self.conversion.current_offset,
                self.conversion.current_scaling,
            )
        };

        let t = index as f64 / self.sample_rate_hz;
        let value = peak * (2.0 * PI * waveform.frequency * t + waveform.phase_offsets[channel.index()]).sin();
        let volts = if scaling != 0.0 {
            offset + value / scaling
        } else {
            offset
        };
        volts_to_raw(volts)
    }
}

impl SampleSource for SimulatedAdc {
    fn buffer(&self) -> &DmaBuffer {
        &self.buffer
    }

    fn handoff(&self) -> &AcquisitionHandoff {
        &self.handoff
    }

    fn start_sampling(&self) -> bool {
        let changed = !self.sampling.swap(true, Ordering::SeqCst);
        if changed {
            debug!("Conversion trigger enabled");
        }
        changed
    }

    fn stop_sampling(&self) -> bool {
        let changed = self.sampling.swap(false, Ordering::SeqCst);
        if changed {
            debug!("Conversion trigger disabled");
        }
        changed
    }

    fn is_sampling(&self) -> bool {
        self.sampling.load(Ordering::SeqCst)
    }
}
