//! Events file records
//!
//! One JSON object per line:
//! `{"instance": "uart-1", "start": 0, "end": 80, "stream": 0, "payload": [0, ["0x55"]]}`.
//! Blank lines and lines starting with `#` are ignored.

use contracts::{StreamId, Value};
use serde::Deserialize;

use crate::error::{CliError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplayRecord {
    instance: String,
    start: u64,
    end: u64,
    stream: StreamId,
    payload: serde_json::Value,
}

/// A recorded `put` call
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    pub instance: String,
    pub start_sample: u64,
    pub end_sample: u64,
    pub stream_id: StreamId,
    pub payload: Value,
}

/// Parse one line (1-based `line_no`, used in errors)
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ReplayEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let record: ReplayRecord =
        serde_json::from_str(trimmed).map_err(|e| CliError::replay_line(line_no, e.to_string()))?;
    let payload = Value::try_from(record.payload)
        .map_err(|e| CliError::replay_line(line_no, e.to_string()))?;

    Ok(Some(ReplayEvent {
        instance: record.instance,
        start_sample: record.start,
        end_sample: record.end,
        stream_id: record.stream,
        payload,
    }))
}
