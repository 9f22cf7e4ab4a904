use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::config::{MAX_DATAGRAM_BYTES, MonitorConfig};
use crate::report::running_line;
use crate::store::AggregationStore;
use crate::telemetry::{ReceivedDatagram, decode_message, send_epoch_ms, task_key};

/// Pause after a failed receive before listening again.
pub const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// What happened to one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Not a JSON object; only the raw line is shown.
    Malformed,
    /// Decoded, but no usable `epoch_ms`/`now`.
    Untimestamped,
    /// Appended to `task`'s series. `summary` is the running line to print.
    Recorded {
        task: String,
        delay_ms: i64,
        summary: String,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct IngestStats {
    pub received: u64,
    pub recorded: u64,
    pub malformed: u64,
    pub untimestamped: u64,
    pub receive_errors: u64,
}

/// Decode → timestamp → record, over an owned store.
#[derive(Debug, Default)]
pub struct Ingestor {
    store: AggregationStore,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(store: AggregationStore) -> Self {
        Self {
            store,
            stats: IngestStats::default(),
        }
    }

    pub fn handle_datagram(&mut self, datagram: &ReceivedDatagram) -> IngestOutcome {
        self.stats.received += 1;

        let Some(message) = decode_message(&datagram.text()) else {
            self.stats.malformed += 1;
            debug!("Ignoring non-telemetry datagram from {}", datagram.source);
            return IngestOutcome::Malformed;
        };

        let Some(send_ms) = send_epoch_ms(&message) else {
            self.stats.untimestamped += 1;
            debug!("Ignoring datagram from {} without a usable timestamp", datagram.source);
            return IngestOutcome::Untimestamped;
        };

        // negative when the device clock runs ahead of ours
        let delay_ms = datagram.arrival_ms().saturating_sub(send_ms);
        let task = task_key(&message);
        let series = self.store.record(&task, delay_ms);
        let summary = running_line(&task, delay_ms, series);
        self.stats.recorded += 1;

        IngestOutcome::Recorded {
            task,
            delay_ms,
            summary,
        }
    }

    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn into_store(self) -> AggregationStore {
        self.store
    }
}

/// Create the listening socket. Failure here is fatal for the monitor.
pub fn bind_socket(config: &MonitorConfig) -> Result<UdpSocket> {
    let addr = config.bind_addr();
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .context("failed to create UDP socket")?;

    if let Err(e) = socket.set_recv_buffer_size(config.recv_buffer_bytes) {
        warn!("Failed to set receive buffer of {} bytes: {}", config.recv_buffer_bytes, e);
    }

    socket
        .bind(&addr.into())
        .with_context(|| format!("failed to bind UDP {addr}"))?;
    socket.set_nonblocking(true)?;

    let socket = UdpSocket::from_std(socket.into())
        .with_context(|| format!("failed to register UDP {addr} with the runtime"))?;
    info!("Listening on UDP {}", socket.local_addr().unwrap_or(addr));
    Ok(socket)
}

/// Receive and record datagrams until `shutdown` resolves, then hand the
/// ingestor back for the final report.
///
/// Shutdown is checked first on every turn, and also cuts short the pause
/// after a receive error; a datagram already being recorded always finishes
/// before the loop stops.
pub async fn run<F>(socket: UdpSocket, mut ingestor: Ingestor, shutdown: F) -> Ingestor
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut buffer = vec![0u8; MAX_DATAGRAM_BYTES];

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping ingest");
                break;
            }
            received = socket.recv_from(&mut buffer) => match received {
                Ok((size, source)) => handle_received(&mut ingestor, source, &buffer[..size]),
                Err(e) => {
                    ingestor.stats.receive_errors += 1;
                    warn!("Error receiving datagram: {}", e);
                    if backoff_interrupted(&mut shutdown).await {
                        info!("Shutdown requested during receive back-off, stopping ingest");
                        break;
                    }
                }
            },
        }
    }

    ingestor
}

/// Wait out [`RECEIVE_ERROR_BACKOFF`]; true when `shutdown` resolved first.
async fn backoff_interrupted<F>(shutdown: &mut F) -> bool
where
    F: Future<Output = ()> + Unpin,
{
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = tokio::time::sleep(RECEIVE_ERROR_BACKOFF) => false,
    }
}

fn handle_received(ingestor: &mut Ingestor, source: SocketAddr, payload: &[u8]) {
    let datagram = ReceivedDatagram::new(source, payload.to_vec());
    println!("{}", datagram.raw_line());

    if let IngestOutcome::Recorded { summary, .. } = ingestor.handle_datagram(&datagram) {
        println!("{summary}");
    }
}
