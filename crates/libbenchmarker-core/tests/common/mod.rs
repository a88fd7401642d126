//! Shared fixtures for the core integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use libbenchmarker_core::{
    BenchError, BenchmarkContext, BenchmarkSpec, Destination, Parameters, RemoteExecutor,
    RemoteTask, Result,
};

pub const DD_OUTPUT: &str = "1+0 records in\n1+0 records out\n\
1073741824 bytes (1.1 GB, 1.0 GiB) copied, 8.7 s, 123.45 MB/s\n";

/// One recorded call to the executor
#[derive(Debug, Clone)]
pub struct Call {
    pub playbook: String,
    pub host: String,
    pub params: Parameters,
}

/// Executor that records its calls and writes a fixed dd artifact
pub struct StubExecutor {
    calls: Mutex<Vec<Call>>,
    output: String,
    /// Fail the call with this (0-based) index
    fail_at: Option<usize>,
    /// Skip writing the artifact
    skip_artifact: bool,
}

impl StubExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: DD_OUTPUT.to_string(),
            fail_at: None,
            skip_artifact: false,
        })
    }

    pub fn with_output(output: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: output.to_string(),
            fail_at: None,
            skip_artifact: false,
        })
    }

    pub fn failing_at(index: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: DD_OUTPUT.to_string(),
            fail_at: Some(index),
            skip_artifact: false,
        })
    }

    pub fn without_artifact() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: DD_OUTPUT.to_string(),
            fail_at: None,
            skip_artifact: true,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RemoteExecutor for StubExecutor {
    fn execute(&self, task: &RemoteTask, host: &str, parameters: &Parameters) -> Result<()> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                playbook: task.playbook.clone(),
                host: host.to_string(),
                params: parameters.clone(),
            });
            calls.len() - 1
        };

        if self.fail_at == Some(index) {
            return Err(BenchError::Execution(format!("{} failed at {}", task.playbook, host)));
        }

        if let (Some(dir), Some(file)) = (
            parameters.get("controller_dir"),
            parameters.get("dd_result_file"),
        ) {
            if !self.skip_artifact {
                std::fs::write(PathBuf::from(dir).join(file), &self.output)?;
            }
        }
        Ok(())
    }
}

pub fn context(stub: &Arc<StubExecutor>) -> BenchmarkContext {
    BenchmarkContext::new(stub.clone())
}

pub fn fixed_spec(name: &str, destinations: usize, repetitions: usize) -> BenchmarkSpec {
    let mut spec = BenchmarkSpec::new(name, "DdFixedParams");
    spec.repetitions = repetitions;
    spec.destinations = (0..destinations)
        .map(|i| Destination::new(format!("dest{}", i), format!("host{}", i), format!("/mnt/d{}", i)))
        .collect();
    spec
}

pub fn sweep_spec(name: &str, dim_key: &str, values: &[&str], repetitions: usize) -> BenchmarkSpec {
    let mut spec = BenchmarkSpec::new(name, "DdOneDimParams");
    spec.repetitions = repetitions;
    spec.destinations = vec![Destination::new("local", "localhost", "/tmp/dd")];
    spec.dim_key = Some(dim_key.to_string());
    spec.dim_values = values.iter().map(|v| (*v).into()).collect();
    spec
}
