//! Core library for benchmarker
//!
//! Benchmarks are declared in configuration by type name, resolved through
//! the [`registry`], constructed (validating their whole configuration before
//! anything runs) and driven by the [`Benchmarker`]. Remote execution and
//! time-series storage are collaborators behind the traits in [`bridge`].

pub mod benchmark;
pub mod bridge;
pub mod config;
pub mod error;
pub mod export;
pub mod parse;
pub mod registry;
pub mod runner;
pub mod scratch;
pub mod types;

pub use benchmark::{Benchmark, BenchmarkContext, DdConfig, DdField, DdFixedParams, DdOneDimParams};
pub use bridge::{Parameters, RemoteExecutor, RemoteTask, ResultsSink};
pub use config::{BenchmarkSpec, ParamValue, TaskSpec};
pub use error::{BenchError, Result};
pub use registry::{registry, BenchmarkFactory, BenchmarkRegistry};
pub use runner::{BenchmarkOutcome, Benchmarker, Phase, RunSummary};
pub use scratch::ScratchSpace;
pub use types::{BenchmarkResults, Destination, Metrics, RunResult, Tags};
