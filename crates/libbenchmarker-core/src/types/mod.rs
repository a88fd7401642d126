pub mod destination;
pub mod results;

pub use destination::Destination;
pub use results::{BenchmarkResults, GroupSummary, Metrics, RunResult, Tags, RUNTIME_FIELD};
