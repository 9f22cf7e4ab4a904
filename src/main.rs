use anyhow::Result;
use clap::Parser;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use telemetry_latency_monitor::config::{
    self, DEFAULT_PORT, DEFAULT_RECV_BUFFER_BYTES, MonitorConfig,
};
use telemetry_latency_monitor::ingest::{self, Ingestor};
use telemetry_latency_monitor::report::print_report;
use telemetry_latency_monitor::store::AggregationStore;

#[derive(Parser, Debug)]
#[command(name = "telemetry-latency-monitor")]
#[command(about = "UDP listener reporting per-task telemetry delay: WCRT and high-water-mark percentiles")]
struct Args {
    /// UDP port the devices send telemetry to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Interface IP to bind to
    #[arg(short = 'i', long, default_value = "0.0.0.0")]
    interface: String,

    /// HWM quantiles for the final report (comma-separated, each in (0, 1])
    #[arg(long, default_value = "1.00,0.99,0.95")]
    hwm: String,

    /// Keep only the newest N samples per task (default: keep all)
    #[arg(short, long)]
    window: Option<usize>,

    /// Time to run in seconds (0 = until interrupted)
    #[arg(short, long, default_value = "0")]
    time: u64,

    /// Socket receive buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_RECV_BUFFER_BYTES)]
    recv_buffer: usize,

    /// Verbose logging (default: false)
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<MonitorConfig> {
        Ok(MonitorConfig {
            bind_ip: config::parse_interface(&self.interface)?,
            port: self.port,
            hwm_quantiles: config::parse_quantiles(&self.hwm)?,
            window: config::parse_window(self.window)?,
            run_duration: (self.time > 0).then(|| Duration::from_secs(self.time)),
            recv_buffer_bytes: self.recv_buffer,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .init();

    let config = args.into_config()?;
    let shutdown = shutdown_signal(config.run_duration);
    run_monitor(&config, shutdown).await
}

/// Bind, ingest until `shutdown` resolves, then print the final report.
async fn run_monitor<F>(config: &MonitorConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    info!("Starting telemetry latency monitor on {}", config.bind_addr());
    match config.window {
        Some(window) => info!("Keeping the newest {} samples per task", window),
        None => info!("Keeping every sample per task"),
    }

    let socket = ingest::bind_socket(config)?;
    println!(
        "Listening for telemetry on UDP port {}... (Ctrl+C for the final report)",
        config.port
    );

    let ingestor = Ingestor::new(AggregationStore::new(config.window));
    let ingestor = ingest::run(socket, ingestor, shutdown).await;

    let stats = ingestor.stats();
    info!(
        "Ingest stopped: {} datagrams, {} recorded, {} malformed, {} without timestamp, {} receive errors",
        stats.received, stats.recorded, stats.malformed, stats.untimestamped, stats.receive_errors
    );

    let store = ingestor.into_store();
    print_report(&store, &config.hwm_quantiles);
    info!(
        "Telemetry latency monitor completed ({} samples across {} tasks)",
        store.total_observed(),
        store.task_count()
    );
    Ok(())
}

/// Resolves on Ctrl+C, SIGTERM, or once the optional run duration elapses.
async fn shutdown_signal(run_duration: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        match run_duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, printing final report"),
        _ = terminate => info!("Received SIGTERM, printing final report"),
        _ = deadline => info!("Run duration completed, printing final report"),
    }
}
