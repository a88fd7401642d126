//! Benchmark runner - orchestrates configuration and execution of a set of benchmarks

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use crate::benchmark::{Benchmark, BenchmarkContext};
use crate::bridge::ResultsSink;
use crate::config::BenchmarkSpec;
use crate::error::{BenchError, Result};
use crate::export::{export_points, write_results_json};
use crate::registry::BenchmarkRegistry;
use crate::scratch::ScratchSpace;
use crate::types::BenchmarkResults;

/// Lifecycle phase a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    PreTask,
    Run,
    PostTask,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::PreTask => "pre_task",
            Phase::Run => "run",
            Phase::PostTask => "post_task",
        }
    }
}

/// A failure recorded for one benchmark
#[derive(Debug, Clone, Serialize)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub code: &'static str,
    pub message: String,
}

impl PhaseFailure {
    fn new(phase: Phase, err: &BenchError) -> Self {
        Self {
            phase,
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

/// What happened to one benchmark
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkOutcome {
    pub name: String,
    pub runs: usize,
    pub failures: Vec<PhaseFailure>,
}

impl BenchmarkOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a whole invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<BenchmarkOutcome>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BenchmarkOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Runs a configured set of benchmarks one after another
pub struct Benchmarker {
    benchmarks: Vec<Box<dyn Benchmark>>,
    setup_failures: Vec<(String, BenchError)>,
    phase_failures: Vec<(String, PhaseFailure)>,
    /// Configuration position of each entry of `benchmarks`
    positions: Vec<usize>,
    /// Configuration position of each entry of `setup_failures`
    failure_positions: Vec<usize>,
}

impl Benchmarker {
    /// Configure benchmarks from raw `[[benchmarks]]` tables.
    ///
    /// An entry that fails to decode or validate is logged and skipped; the
    /// remaining entries are still configured.
    pub fn configure(
        entries: impl IntoIterator<Item = toml::Value>,
        registry: &BenchmarkRegistry,
        ctx: &BenchmarkContext,
    ) -> Self {
        let mut specs = Vec::new();
        let mut failures = Vec::new();
        for (position, entry) in entries.into_iter().enumerate() {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("<unnamed>")
                .to_string();
            match BenchmarkSpec::from_toml(entry) {
                Ok(spec) => specs.push((position, spec)),
                Err(e) => {
                    error!("Skipping benchmark '{}': {}", name, e);
                    failures.push((position, name, e));
                }
            }
        }

        Self::build(
            specs.iter().map(|(position, spec)| (*position, spec)),
            failures,
            registry,
            ctx,
        )
    }

    /// Configure benchmarks from decoded specs, keeping their order
    pub fn from_specs(specs: &[BenchmarkSpec], registry: &BenchmarkRegistry, ctx: &BenchmarkContext) -> Self {
        Self::build(specs.iter().enumerate(), Vec::new(), registry, ctx)
    }

    fn build<'a>(
        specs: impl Iterator<Item = (usize, &'a BenchmarkSpec)>,
        mut failures: Vec<(usize, String, BenchError)>,
        registry: &BenchmarkRegistry,
        ctx: &BenchmarkContext,
    ) -> Self {
        let mut benchmarks: Vec<Box<dyn Benchmark>> = Vec::new();
        let mut positions = Vec::new();
        let mut names = HashSet::new();

        for (position, spec) in specs {
            let result = if names.contains(spec.name.as_str()) {
                Err(BenchError::config_for(&spec.name, "duplicate benchmark name"))
            } else {
                registry.construct(spec, ctx)
            };

            match result {
                Ok(bm) => {
                    info!("Configured benchmark '{}' ({})", bm.name(), bm.type_name());
                    names.insert(spec.name.as_str());
                    benchmarks.push(bm);
                    positions.push(position);
                }
                Err(e) => {
                    error!("Skipping benchmark '{}': {}", spec.name, e);
                    failures.push((position, spec.name.clone(), e));
                }
            }
        }

        failures.sort_by_key(|(position, _, _)| *position);
        let mut failure_positions = Vec::with_capacity(failures.len());
        let mut setup_failures = Vec::with_capacity(failures.len());
        for (position, name, e) in failures {
            failure_positions.push(position);
            setup_failures.push((name, e));
        }

        Self {
            benchmarks,
            setup_failures,
            phase_failures: Vec::new(),
            positions,
            failure_positions,
        }
    }

    /// Use already constructed benchmarks
    pub fn with_benchmarks(benchmarks: Vec<Box<dyn Benchmark>>) -> Self {
        let positions = (0..benchmarks.len()).collect();
        Self {
            benchmarks,
            setup_failures: Vec::new(),
            phase_failures: Vec::new(),
            positions,
            failure_positions: Vec::new(),
        }
    }

    /// Benchmarks that could not be configured, in configuration order
    pub fn setup_failures(&self) -> &[(String, BenchError)] {
        &self.setup_failures
    }

    pub fn benchmarks(&self) -> impl Iterator<Item = &dyn Benchmark> {
        self.benchmarks.iter().map(|bm| bm.as_ref())
    }

    pub fn run_pre_tasks(&mut self) {
        info!("Running pre-tasks for benchmarks");
        for bm in self.benchmarks.iter_mut() {
            if let Err(e) = bm.run_pre_task() {
                error!("Pre-task of '{}' failed: {}", bm.name(), e);
                self.phase_failures
                    .push((bm.name().to_string(), PhaseFailure::new(Phase::PreTask, &e)));
            }
        }
    }

    /// Run every benchmark in order; a failing benchmark does not stop the others
    pub fn run(&mut self, scratch: &ScratchSpace) {
        for bm in self.benchmarks.iter_mut() {
            info!("Running benchmark '{}'", bm.name());
            if let Err(e) = bm.run(scratch) {
                error!("Benchmark '{}' failed: {}", bm.name(), e);
                self.phase_failures
                    .push((bm.name().to_string(), PhaseFailure::new(Phase::Run, &e)));
            }
        }
    }

    pub fn run_post_tasks(&mut self) {
        info!("Running post-tasks for benchmarks");
        for bm in self.benchmarks.iter_mut() {
            if let Err(e) = bm.run_post_task() {
                error!("Post-task of '{}' failed: {}", bm.name(), e);
                self.phase_failures
                    .push((bm.name().to_string(), PhaseFailure::new(Phase::PostTask, &e)));
            }
        }
    }

    /// Pre-tasks, runs and post-tasks of every benchmark.
    ///
    /// Result artifacts live in a scratch directory that is removed once the
    /// last benchmark has run. The directory is acquired before any hook, so
    /// failing to create it leaves nothing to tear down.
    pub fn run_all(&mut self) -> Result<RunSummary> {
        let scratch = ScratchSpace::new()?;
        self.phase_failures.clear();
        self.run_pre_tasks();

        self.run(&scratch);
        if let Err(e) = scratch.close() {
            error!("Failed to remove scratch directory: {}", e);
        }

        self.run_post_tasks();
        Ok(self.summary())
    }

    /// Outcomes so far, including setup failures, in configuration order
    pub fn summary(&self) -> RunSummary {
        let mut outcomes: Vec<(usize, BenchmarkOutcome)> = self
            .setup_failures
            .iter()
            .zip(&self.failure_positions)
            .map(|((name, e), position)| {
                let outcome = BenchmarkOutcome {
                    name: name.clone(),
                    runs: 0,
                    failures: vec![PhaseFailure::new(Phase::Setup, e)],
                };
                (*position, outcome)
            })
            .collect();

        for (bm, position) in self.benchmarks.iter().zip(&self.positions) {
            let failures = self
                .phase_failures
                .iter()
                .filter(|(name, _)| name == bm.name())
                .map(|(_, f)| f.clone())
                .collect();
            let outcome = BenchmarkOutcome {
                name: bm.name().to_string(),
                runs: bm.results().total_runs(),
                failures,
            };
            outcomes.push((*position, outcome));
        }

        outcomes.sort_by_key(|(position, _)| *position);
        RunSummary {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }

    /// Results of every configured benchmark, in configuration order
    pub fn results(&self) -> Vec<&BenchmarkResults> {
        self.benchmarks.iter().map(|bm| bm.results()).collect()
    }

    /// Persist the results document
    pub fn save_results(&self, path: &Path) -> Result<()> {
        write_results_json(path, &self.results())?;
        info!("Results saved to {}", path.display());
        Ok(())
    }

    /// Export every run to a time-series sink; returns the number of points
    pub fn send_results(&self, sink: &mut dyn ResultsSink) -> Result<usize> {
        let mut written = 0;
        for bm in &self.benchmarks {
            written += export_points(sink, &bm.tags(), bm.results())?;
        }
        info!("Exported {} points", written);
        Ok(written)
    }
}
