use anyhow::Context;
use clap::Parser;
use pmucore::core::{PipelineConfig, CHANNELS, FRAME_SIZE};
use pmucore::engine::PhasorPipeline;
use pmucore::hal::mock::{SimulatedAdc, SimulatedWaveform};
use pmucore::hal::SampleSource;
use pmucore::observability::PipelineMonitor;
use pmucore::sink::{result_channel, spawn_sink_task, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pmu", about = "Phasor measurement pipeline running on a simulated converter")]
struct CliArgs {
    /// Pipeline configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<String>,

    /// Frequency of the simulated grid signal (Hz)
    #[arg(long, default_value_t = 50.0)]
    frequency: f64,

    /// Stop after this many seconds; runs until Ctrl-C when omitted
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Statistics report period, in supervisor ticks of one second
    #[arg(long, default_value_t = 10)]
    report_every_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => PipelineConfig::default(),
    };

    info!(
        sample_rate_hz = config.sample_rate_hz,
        frame_size = FRAME_SIZE,
        channels = CHANNELS,
        fft_size = config.fft_size,
        frame_ms = config.frame_duration() * 1000.0,
        bin_resolution = config.bin_resolution(),
        "Phasor measurement unit starting"
    );

    let waveform = SimulatedWaveform::three_phase(args.frequency, 230.0, 5.0, 0.3);
    let adc = Arc::new(SimulatedAdc::new(config.sample_rate_hz, config.conversion, waveform));

    let (publisher, results_rx) = result_channel(config.result_capacity)?;
    let (shutdown_tx, _) = broadcast::channel(4);
    let sink_handle = spawn_sink_task(results_rx, TracingSink::new(), shutdown_tx.subscribe());

    let mut pipeline = PhasorPipeline::new(config.clone());
    pipeline.configure(adc.clone(), publisher)?;
    let adc_thread = adc.spawn_free_running()?;
    pipeline.start()?;

    let monitor = PipelineMonitor::new(Duration::from_secs_f64(config.frame_duration()));
    let report_every = args.report_every_secs.max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut ticks = 0u64;
    let mut signals_dropped = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
        ticks += 1;

        if !adc.is_sampling() {
            warn!("Sampling has stopped");
        }
        let stats = pipeline.statistics();
        if stats.signals_dropped > signals_dropped {
            warn!(
                dropped = stats.signals_dropped - signals_dropped,
                total = stats.signals_dropped,
                "Hand-off signals dropped"
            );
            signals_dropped = stats.signals_dropped;
        }
        if ticks % report_every == 0 {
            info!("\n{}", monitor.generate_report(&stats));
        }
        if args.duration_secs.is_some_and(|limit| ticks > limit) {
            break;
        }
    }

    pipeline.stop()?;
    adc.stop_sampling();
    adc.shutdown();
    if adc_thread.join().is_err() {
        warn!("Converter thread panicked");
    }

    let _ = shutdown_tx.send(());
    let delivered = sink_handle.await??;
    info!("\n{}", monitor.generate_report(&pipeline.statistics()));
    info!(delivered, "Phasor measurement unit stopped");

    Ok(())
}
