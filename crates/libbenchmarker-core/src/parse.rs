//! Parsing of dd result artifacts
//!
//! dd prints its transfer summary as the last line of stderr, e.g.
//! `1073741824 bytes (1.1 GB, 1.0 GiB) copied, 8.69 s, 124 MB/s`.
//! Only the bandwidth at the end of that line is extracted. Output that does
//! not match is recorded as zero bandwidth so a sweep keeps going.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::{BenchError, Result};
use crate::types::Metrics;

/// Metric name for the dd bandwidth
pub const BW_IN_MB: &str = "bw_in_mb";

fn bandwidth_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r" s, ([0-9.]+) MB/s$").expect("bandwidth pattern is valid"))
}

/// Parse a result artifact produced by a dd run
pub fn parse_result_file(path: &Path) -> Result<Metrics> {
    if !path.is_file() {
        return Err(BenchError::Artifact(format!(
            "{} is not a file",
            path.display()
        )));
    }

    // dd may print localized, non-UTF-8 error text
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let bw = parse_bandwidth(&content).unwrap_or_else(|| {
        warn!("No bandwidth found in {}, recording 0", path.display());
        0.0
    });

    let mut metrics = Metrics::new();
    metrics.insert(BW_IN_MB.to_string(), bw);
    Ok(metrics)
}

/// Extract the bandwidth from the last line of dd output
pub fn parse_bandwidth(content: &str) -> Option<f64> {
    let last_line = content.lines().last()?;
    bandwidth_pattern()
        .captures(last_line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
