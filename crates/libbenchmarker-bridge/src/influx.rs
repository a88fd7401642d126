//! InfluxDB line-protocol output
//!
//! Each exported point becomes one line:
//!
//! ```text
//! benchmark_result,benchmark_name=dd,group=nfs bw_in_mb=123.45,runtime_in_s=8.7 1700000000000000000
//! ```
//!
//! The file can be loaded with `influx write` or any client that accepts
//! line protocol.

use std::io::Write;

use chrono::{DateTime, Utc};
use libbenchmarker_core::{Metrics, Result, ResultsSink, Tags};
use tracing::warn;

use crate::error::BridgeError;

/// Writes points as InfluxDB line protocol
pub struct LineProtocolWriter<W: Write> {
    out: W,
    /// Pinned timestamp; the current time is used when unset
    timestamp: Option<DateTime<Utc>>,
}

impl<W: Write> LineProtocolWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            timestamp: None,
        }
    }

    /// Stamp every point with `timestamp` instead of the time of writing
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultsSink for LineProtocolWriter<W> {
    fn write(&mut self, series: &str, tags: &Tags, fields: &Metrics) -> Result<()> {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let line = format_line(series, tags, fields, timestamp)?;
        writeln!(self.out, "{}", line)?;
        Ok(())
    }
}

/// Format one point. Tags come out sorted by key; empty tag values and
/// non-finite field values are left out. Line breaks cannot be represented
/// in line protocol, so any name, key or tag value carrying one is rejected.
pub fn format_line(
    series: &str,
    tags: &Tags,
    fields: &Metrics,
    timestamp: DateTime<Utc>,
) -> std::result::Result<String, BridgeError> {
    if series.is_empty() {
        return Err(BridgeError::InvalidPoint("empty series name".to_string()));
    }

    let mut line = escape(series, &[',', ' ', '\\'])?;
    for (key, value) in tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key)?);
        line.push('=');
        line.push_str(&escape_key(value)?);
    }

    let mut field_set = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        if !value.is_finite() {
            warn!("Dropping non-finite field {}={} from {}", key, value, series);
            continue;
        }
        field_set.push(format!("{}={}", escape_key(key)?, value));
    }
    if field_set.is_empty() {
        return Err(BridgeError::InvalidPoint(format!(
            "point in {} has no fields",
            series
        )));
    }

    let nanos = timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| BridgeError::InvalidPoint(format!("timestamp {} out of range", timestamp)))?;

    line.push(' ');
    line.push_str(&field_set.join(","));
    line.push(' ');
    line.push_str(&nanos.to_string());
    Ok(line)
}

fn escape_key(s: &str) -> std::result::Result<String, BridgeError> {
    escape(s, &[',', '=', ' ', '\\'])
}

fn escape(s: &str, special: &[char]) -> std::result::Result<String, BridgeError> {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\n' || c == '\r' {
            return Err(BridgeError::InvalidPoint(format!(
                "line break in {:?}",
                s
            )));
        }
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(out)
}
