use thiserror::Error;

/// Startup configuration errors. All of them are fatal: the monitor refuses
/// to start rather than report percentiles it cannot label.
#[derive(Debug, Error, PartialEq)]
pub enum MonitorError {
    #[error("invalid HWM quantile '{0}': expected a number in (0, 1]")]
    InvalidQuantile(String),

    #[error("at least one HWM quantile must be configured")]
    NoQuantiles,

    #[error("series window must hold at least one sample")]
    ZeroWindow,

    #[error("invalid interface address '{0}'")]
    InvalidInterface(String),
}
