use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::MonitorError;

/// Port the device firmware sends telemetry to.
pub const DEFAULT_PORT: u16 = 6010;

/// HWM set printed in the final report: 100%, 99%, 95%.
pub const DEFAULT_HWM_QUANTILES: [f64; 3] = [1.00, 0.99, 0.95];

/// Two-point HWM snapshot shown on every accepted datagram.
pub const RUNNING_HWM_QUANTILES: [f64; 2] = [1.00, 0.99];

/// Socket receive buffer requested from the kernel (1MB).
pub const DEFAULT_RECV_BUFFER_BYTES: usize = 1024 * 1024;

/// Largest UDP payload we can be handed.
pub const MAX_DATAGRAM_BYTES: usize = 65536;

/// Validated runtime configuration, fixed at process start.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub bind_ip: IpAddr,
    pub port: u16,
    pub hwm_quantiles: Vec<f64>,
    /// Per-task sample capacity; `None` keeps every sample.
    pub window: Option<usize>,
    /// Stop after this long; `None` runs until interrupted.
    pub run_duration: Option<Duration>,
    pub recv_buffer_bytes: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            hwm_quantiles: DEFAULT_HWM_QUANTILES.to_vec(),
            window: None,
            run_duration: None,
            recv_buffer_bytes: DEFAULT_RECV_BUFFER_BYTES,
        }
    }
}

impl MonitorConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

pub fn parse_interface(raw: &str) -> Result<IpAddr, MonitorError> {
    raw.trim()
        .parse()
        .map_err(|_| MonitorError::InvalidInterface(raw.to_string()))
}

/// Parse a comma-separated quantile list such as `1.00,0.99,0.95`.
/// Order is kept: it is the order the HWMs are printed in.
pub fn parse_quantiles(raw: &str) -> Result<Vec<f64>, MonitorError> {
    let quantiles = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<f64>() {
            Ok(q) if q > 0.0 && q <= 1.0 => Ok(q),
            _ => Err(MonitorError::InvalidQuantile(s.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if quantiles.is_empty() {
        return Err(MonitorError::NoQuantiles);
    }
    Ok(quantiles)
}

pub fn parse_window(window: Option<usize>) -> Result<Option<usize>, MonitorError> {
    match window {
        Some(0) => Err(MonitorError::ZeroWindow),
        other => Ok(other),
    }
}
