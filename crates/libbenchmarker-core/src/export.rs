//! Results export: JSON document and time-series points

use std::path::Path;

use crate::bridge::ResultsSink;
use crate::error::Result;
use crate::types::{BenchmarkResults, Tags};

/// Default file name of the results document
pub const DEFAULT_RESULTS_FILE: &str = "results.json";

/// Series every result point is written to
pub const RESULT_SERIES: &str = "benchmark_result";

/// Write the results document: one object per benchmark, in order
pub fn write_results_json(path: &Path, results: &[&BenchmarkResults]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(results)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Read a results document written by [`write_results_json`]
pub fn read_results_json(path: &Path) -> Result<Vec<BenchmarkResults>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write one point per run of `results` to `sink`.
///
/// Each point carries `tags` plus the grouping key (`group`) and the
/// repetition index. Returns the number of points written.
pub fn export_points(sink: &mut dyn ResultsSink, tags: &Tags, results: &BenchmarkResults) -> Result<usize> {
    let mut written = 0;
    for (key, runs) in results.iter() {
        for (repetition, run) in runs.iter().enumerate() {
            let mut point_tags = tags.clone();
            point_tags.insert("group".to_string(), key.to_string());
            point_tags.insert("repetition".to_string(), repetition.to_string());
            sink.write(RESULT_SERIES, &point_tags, &run.fields())?;
            written += 1;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metrics, RunResult};
    use tempfile::tempdir;

    #[derive(Default)]
    struct MemorySink {
        points: Vec<(String, Tags, Metrics)>,
    }

    impl ResultsSink for MemorySink {
        fn write(&mut self, series: &str, tags: &Tags, fields: &Metrics) -> Result<()> {
            self.points.push((series.to_string(), tags.clone(), fields.clone()));
            Ok(())
        }
    }

    fn sample_results() -> BenchmarkResults {
        let mut metrics = Metrics::new();
        metrics.insert("bw_in_mb".to_string(), 42.0);
        let mut results = BenchmarkResults::new();
        results.commit(
            "nfs",
            vec![RunResult::new(metrics.clone(), 1.0), RunResult::new(metrics, 2.0)],
        );
        results
    }

    #[test]
    fn test_results_document_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join(DEFAULT_RESULTS_FILE);
        let results = sample_results();

        write_results_json(&path, &[&results, &BenchmarkResults::new()]).unwrap();
        let loaded = read_results_json(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], results);
        assert!(loaded[1].is_empty());
    }

    #[test]
    fn test_results_document_is_array_of_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_results_json(&path, &[&sample_results()]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["nfs"][1]["runtime_in_s"], 2.0);
        assert_eq!(value[0]["nfs"][0]["bw_in_mb"], 42.0);
    }

    #[test]
    fn test_export_points_tags_each_run() {
        let mut sink = MemorySink::default();
        let mut tags = Tags::new();
        tags.insert("benchmark_name".to_string(), "dd".to_string());

        let written = export_points(&mut sink, &tags, &sample_results()).unwrap();
        assert_eq!(written, 2);

        let (series, tags, fields) = &sink.points[1];
        assert_eq!(series, RESULT_SERIES);
        assert_eq!(tags["benchmark_name"], "dd");
        assert_eq!(tags["group"], "nfs");
        assert_eq!(tags["repetition"], "1");
        assert_eq!(fields["runtime_in_s"], 2.0);
        assert_eq!(fields["bw_in_mb"], 42.0);
    }
}
