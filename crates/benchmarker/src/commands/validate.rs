use libbenchmarker_core::{registry, BenchError, Benchmarker};
use serde::Serialize;

use crate::cli::Cli;
use crate::config::load_config;
use crate::output::output_success;

#[derive(Serialize)]
struct ValidatedBenchmark {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ValidateOutput {
    benchmarks: Vec<ValidatedBenchmark>,
}

/// Configure every benchmark without running anything
pub fn run(cli: &Cli) -> Result<(), BenchError> {
    let config = load_config(&cli.config)?;
    let benchmarker = Benchmarker::configure(config.benchmarks.clone(), registry(), &config.context());

    let benchmarks: Vec<ValidatedBenchmark> = benchmarker
        .summary()
        .outcomes
        .into_iter()
        .map(|outcome| {
            let kind = benchmarker
                .benchmarks()
                .find(|bm| outcome.is_success() && bm.name() == outcome.name)
                .map(|bm| bm.type_name().to_string());
            ValidatedBenchmark {
                ok: outcome.is_success(),
                error: outcome.failures.first().map(|f| f.message.clone()),
                name: outcome.name,
                kind,
            }
        })
        .collect();

    let failed = benchmarker.setup_failures().len();
    output_success(cli, ValidateOutput { benchmarks }, |out| {
        for bm in &out.benchmarks {
            match (&bm.kind, &bm.error) {
                (Some(kind), None) => println!("ok      {} ({})", bm.name, kind),
                (_, Some(error)) => println!("FAILED  {}: {}", bm.name, error),
                (None, None) => println!("ok      {}", bm.name),
            }
        }
    });

    if failed > 0 {
        return Err(BenchError::Config(format!(
            "{} benchmark(s) failed validation",
            failed
        )));
    }
    Ok(())
}
