//! The benchmark contract
//!
//! Every benchmark type goes through the same lifecycle, driven by the
//! [`Benchmarker`](crate::runner::Benchmarker):
//!
//! 1. constructed from its [`BenchmarkSpec`], validating everything up front
//! 2. `run_pre_task` (optional setup)
//! 3. `run`, filling its [`BenchmarkResults`]
//! 4. `run_post_task` (optional teardown)
//!
//! Results are only read once every benchmark has finished `run`.

pub mod dd;

use std::sync::Arc;

use crate::bridge::{Parameters, RemoteExecutor, RemoteTask};
use crate::config::{BenchmarkSpec, TaskSpec};
use crate::error::{BenchError, Result};
use crate::scratch::ScratchSpace;
use crate::types::{BenchmarkResults, Destination, Tags};

pub use dd::{DdConfig, DdConfigOverrides, DdField, DdFixedParams, DdOneDimParams};

/// Shared collaborators available while constructing benchmarks
#[derive(Clone)]
pub struct BenchmarkContext {
    executor: Arc<dyn RemoteExecutor>,
}

impl BenchmarkContext {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> Arc<dyn RemoteExecutor> {
        Arc::clone(&self.executor)
    }
}

/// A configured, repeatable measurement procedure
pub trait Benchmark {
    /// Configured benchmark name
    fn name(&self) -> &str;

    /// Registered type name
    fn type_name(&self) -> &'static str;

    /// Setup against shared infrastructure; no-op unless overridden
    fn run_pre_task(&mut self) -> Result<()> {
        Ok(())
    }

    /// Execute the benchmark, replacing any previous results
    fn run(&mut self, scratch: &ScratchSpace) -> Result<()>;

    /// Teardown; no-op unless overridden
    fn run_post_task(&mut self) -> Result<()> {
        Ok(())
    }

    /// Results gathered by the last `run`
    fn results(&self) -> &BenchmarkResults;

    /// Labels for exported points
    fn tags(&self) -> Tags {
        base_tags(self.name(), self.type_name())
    }
}

/// Tags every benchmark exports
pub fn base_tags(name: &str, type_name: &str) -> Tags {
    let mut tags = Tags::new();
    tags.insert("benchmark_name".to_string(), name.to_string());
    tags.insert("benchmark_type".to_string(), type_name.to_string());
    tags
}

/// State shared by all benchmark types
pub(crate) struct BenchmarkBase {
    pub name: String,
    pub repetitions: usize,
    pub results: BenchmarkResults,
    pub executor: Arc<dyn RemoteExecutor>,
    pub pre_task: Option<RemoteTask>,
    pub post_task: Option<RemoteTask>,
}

impl BenchmarkBase {
    pub fn new(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(BenchError::Config("benchmark name must not be empty".to_string()));
        }
        if spec.repetitions == 0 {
            return Err(BenchError::config_for(
                &spec.name,
                "'repetitions' must be at least 1",
            ));
        }

        Ok(Self {
            name: spec.name.clone(),
            repetitions: spec.repetitions,
            results: BenchmarkResults::new(),
            executor: ctx.executor(),
            pre_task: hook_task(&spec.name, spec.pre_task.as_ref())?,
            post_task: hook_task(&spec.name, spec.post_task.as_ref())?,
        })
    }

    /// Run a hook playbook at each destination, in order
    pub fn run_hook(&self, task: Option<&RemoteTask>, destinations: &[Destination]) -> Result<()> {
        let Some(task) = task else {
            return Ok(());
        };
        for dest in destinations {
            tracing::info!(
                "Running {} for {} at {}",
                task.playbook,
                self.name,
                dest.name
            );
            let mut params = Parameters::new();
            params.insert("dd_dir".to_string(), dest.target_folder.clone());
            self.executor.execute(task, &dest.host, &params)?;
        }
        Ok(())
    }
}

fn hook_task(benchmark: &str, spec: Option<&TaskSpec>) -> Result<Option<RemoteTask>> {
    match spec {
        Some(task) if task.playbook.trim().is_empty() => Err(BenchError::config_for(
            benchmark,
            "hook playbook must not be empty",
        )),
        Some(task) => Ok(Some(RemoteTask::new(task.playbook.clone()))),
        None => Ok(None),
    }
}

/// Validate the destination list of a spec
pub(crate) fn validate_destinations(spec: &BenchmarkSpec) -> Result<Vec<Destination>> {
    if spec.destinations.is_empty() {
        return Err(BenchError::config_for(
            &spec.name,
            "at least one destination is required",
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for dest in &spec.destinations {
        dest.validate().map_err(|e| match e {
            BenchError::Config(msg) => BenchError::config_for(&spec.name, msg),
            other => other,
        })?;
        if !seen.insert(dest.name.as_str()) {
            return Err(BenchError::config_for(
                &spec.name,
                format!("duplicate destination name '{}'", dest.name),
            ));
        }
    }
    Ok(spec.destinations.clone())
}
