//! Exporting benchmark results through the line-protocol writer

use chrono::{TimeZone, Utc};
use libbenchmarker_bridge::LineProtocolWriter;
use libbenchmarker_core::export::export_points;
use libbenchmarker_core::{BenchmarkResults, Metrics, RunResult, Tags};

#[test]
fn test_export_results_as_lines() {
    let mut metrics = Metrics::new();
    metrics.insert("bw_in_mb".to_string(), 250.0);

    let mut results = BenchmarkResults::new();
    results.commit("1M", vec![RunResult::new(metrics.clone(), 1.5)]);
    results.commit(
        "1G",
        vec![RunResult::new(metrics.clone(), 2.0), RunResult::new(metrics, 2.25)],
    );

    let mut tags = Tags::new();
    tags.insert("benchmark_name".to_string(), "dd sweep".to_string());
    tags.insert("dim_values".to_string(), "1M,1G".to_string());

    let mut writer =
        LineProtocolWriter::new(Vec::new()).with_timestamp(Utc.timestamp_opt(1, 0).unwrap());
    let written = export_points(&mut writer, &tags, &results).unwrap();
    assert_eq!(written, 3);

    let out = String::from_utf8(writer.into_inner()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            r"benchmark_result,benchmark_name=dd\ sweep,dim_values=1M\,1G,group=1M,repetition=0 bw_in_mb=250,runtime_in_s=1.5 1000000000",
            r"benchmark_result,benchmark_name=dd\ sweep,dim_values=1M\,1G,group=1G,repetition=0 bw_in_mb=250,runtime_in_s=2 1000000000",
            r"benchmark_result,benchmark_name=dd\ sweep,dim_values=1M\,1G,group=1G,repetition=1 bw_in_mb=250,runtime_in_s=2.25 1000000000",
        ]
    );
}
