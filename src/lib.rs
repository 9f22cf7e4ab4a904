//! Per-task latency statistics for UDP telemetry from embedded devices.
//!
//! Devices stamp each JSON datagram with their send time (`epoch_ms` or an
//! ISO-8601 `now`); the monitor computes `arrival - send` per datagram, groups
//! the delays by task and reports worst-case and high-water-mark percentiles.

pub mod config;
pub mod error;
pub mod ingest;
pub mod iso8601;
pub mod percentile;
pub mod report;
pub mod series;
pub mod store;
pub mod telemetry;
