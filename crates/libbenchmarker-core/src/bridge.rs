//! Collaborator interfaces the core drives
//!
//! The core never talks to a host or a database itself. Remote execution goes
//! through a [`RemoteExecutor`], exported points through a [`ResultsSink`].

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{Metrics, Tags};

/// Parameters handed to a remote task
pub type Parameters = BTreeMap<String, String>;

/// A predefined task (playbook) that can be executed at a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTask {
    pub playbook: String,
}

impl RemoteTask {
    pub fn new(playbook: impl Into<String>) -> Self {
        Self {
            playbook: playbook.into(),
        }
    }
}

/// Executes a task at a host and blocks until it finishes.
///
/// Implementations return `BenchError::Execution` when the task does not
/// succeed. Any timeout is the implementation's business.
pub trait RemoteExecutor: Send + Sync {
    fn execute(&self, task: &RemoteTask, host: &str, parameters: &Parameters) -> Result<()>;
}

/// Receives exported result points
pub trait ResultsSink {
    fn write(&mut self, series: &str, tags: &Tags, fields: &Metrics) -> Result<()>;
}
