use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use comfy_table::{presets::UTF8_FULL, Table};
use libbenchmarker_bridge::LineProtocolWriter;
use libbenchmarker_core::parse::BW_IN_MB;
use libbenchmarker_core::types::GroupSummary;
use libbenchmarker_core::{registry, BenchError, BenchmarkOutcome, Benchmarker};
use serde::Serialize;
use tracing::info;

use crate::cli::Cli;
use crate::config::load_config;
use crate::output::output_success;

#[derive(Serialize)]
struct BenchmarkReport {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    groups: Vec<GroupSummary>,
}

#[derive(Serialize)]
struct RunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    results_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points_exported: Option<usize>,
    outcomes: Vec<BenchmarkOutcome>,
    benchmarks: Vec<BenchmarkReport>,
}

pub fn run(
    cli: &Cli,
    results: Option<PathBuf>,
    line_protocol: Option<PathBuf>,
    no_save: bool,
) -> Result<(), BenchError> {
    let config = load_config(&cli.config)?;
    let mut benchmarker =
        Benchmarker::configure(config.benchmarks.clone(), registry(), &config.context());

    let summary = benchmarker.run_all()?;

    let results_file = if no_save {
        None
    } else {
        let path = results.unwrap_or_else(|| config.results_file());
        benchmarker.save_results(&path)?;
        Some(path)
    };

    let points_exported = match line_protocol {
        Some(path) => {
            let mut writer = LineProtocolWriter::new(BufWriter::new(File::create(&path)?));
            let written = benchmarker.send_results(&mut writer)?;
            writer.flush()?;
            info!("Line protocol written to {}", path.display());
            Some(written)
        }
        None => None,
    };

    let benchmarks = benchmarker
        .benchmarks()
        .map(|bm| BenchmarkReport {
            name: bm.name().to_string(),
            kind: bm.type_name().to_string(),
            groups: bm.results().summary(),
        })
        .collect();

    let failed: Vec<&BenchmarkOutcome> = summary.failed().collect();
    let setup_failed = failed
        .iter()
        .any(|o| o.failures.iter().any(|f| f.code == "config_error"));
    let failed_count = failed.len();

    let output = RunOutput {
        results_file,
        points_exported,
        outcomes: summary.outcomes.clone(),
        benchmarks,
    };
    output_success(cli, output, print_report);

    if failed_count == 0 {
        return Ok(());
    }
    let msg = format!(
        "{} of {} benchmark(s) failed",
        failed_count,
        summary.outcomes.len()
    );
    if setup_failed {
        Err(BenchError::Config(msg))
    } else {
        Err(BenchError::Execution(msg))
    }
}

fn print_report(output: &RunOutput) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Benchmark", "Group", "Runs", "Mean bw (MB/s)", "Mean runtime (s)"]);
    for bm in &output.benchmarks {
        for group in &bm.groups {
            let bandwidth = group
                .mean_metrics
                .get(BW_IN_MB)
                .map(|bw| format!("{:.2}", bw))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                bm.name.clone(),
                group.key.clone(),
                group.runs.to_string(),
                bandwidth,
                format!("{:.2}", group.mean_runtime_seconds),
            ]);
        }
    }
    println!("{}", table);

    for outcome in &output.outcomes {
        for failure in &outcome.failures {
            println!(
                "FAILED  {} [{}]: {}",
                outcome.name,
                failure.phase.as_str(),
                failure.message
            );
        }
    }

    if let Some(ref path) = output.results_file {
        println!("Results saved to {}", path.display());
    }
    if let Some(points) = output.points_exported {
        println!("Exported {} points", points);
    }
}
