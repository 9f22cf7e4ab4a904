use std::borrow::Cow;
use std::net::SocketAddr;

use chrono::{DateTime, Local, Utc};
use serde_json::{Map, Value};

use crate::iso8601;

/// Task key used when a message names no task at all.
pub const UNKNOWN_TASK: &str = "UNKNOWN";

/// Fields tried, in order, when classifying a message into a task.
const TASK_FIELDS: [&str; 4] = ["task", "name", "tag", "event"];

/// A decoded telemetry record. Every field is optional.
pub type TelemetryMessage = Map<String, Value>;

/// A datagram as it came off the socket, stamped on arrival.
#[derive(Debug, Clone)]
pub struct ReceivedDatagram {
    pub source: SocketAddr,
    pub arrived_at: DateTime<Utc>,
    pub payload: Vec<u8>,
}

impl ReceivedDatagram {
    pub fn new(source: SocketAddr, payload: Vec<u8>) -> Self {
        Self::at(source, payload, Utc::now())
    }

    pub fn at(source: SocketAddr, payload: Vec<u8>, arrived_at: DateTime<Utc>) -> Self {
        Self {
            source,
            arrived_at,
            payload,
        }
    }

    pub fn arrival_ms(&self) -> i64 {
        self.arrived_at.timestamp_millis()
    }

    /// Payload as text; invalid UTF-8 is replaced, never rejected.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// `[HH:MM:SS] ip:port -> payload`, arrival time in local time.
    pub fn raw_line(&self) -> String {
        format!(
            "[{}] {} -> {}",
            self.arrived_at.with_timezone(&Local).format("%H:%M:%S"),
            self.source,
            self.text()
        )
    }
}

/// Decode a payload into a telemetry record. Anything that is not a JSON
/// object (invalid JSON, arrays, bare scalars) is not telemetry.
pub fn decode_message(text: &str) -> Option<TelemetryMessage> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Sender-side emission instant in epoch milliseconds.
///
/// `epoch_ms` wins when it is a number (floats are truncated toward zero).
/// Otherwise `now` is parsed as ISO-8601, with a trailing `Z` meaning UTC and
/// an offset-less value assumed to be UTC. Returns `None` when neither field
/// yields a usable instant.
pub fn send_epoch_ms(message: &TelemetryMessage) -> Option<i64> {
    if let Some(Value::Number(n)) = message.get("epoch_ms") {
        return n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64));
    }
    match message.get("now") {
        Some(Value::String(now)) => iso8601::parse_epoch_ms(now),
        _ => None,
    }
}

/// Grouping key: the first truthy of `task`, `name`, `tag`, `event`.
pub fn task_key(message: &TelemetryMessage) -> String {
    TASK_FIELDS
        .iter()
        .find_map(|field| message.get(*field).and_then(truthy_text))
        .unwrap_or_else(|| UNKNOWN_TASK.to_string())
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}
