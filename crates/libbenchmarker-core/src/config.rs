use std::fmt;

use serde::{Deserialize, Serialize};

use crate::benchmark::dd::DdConfigOverrides;
use crate::error::{BenchError, Result};
use crate::types::Destination;

fn default_repetitions() -> usize {
    1
}

/// One `[[benchmarks]]` entry of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkSpec {
    /// Unique benchmark name
    pub name: String,
    /// Registered benchmark type, e.g. "DdFixedParams"
    #[serde(rename = "type")]
    pub kind: String,
    /// Repetitions per grouping key
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    /// Overrides for the dd defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dd: Option<DdConfigOverrides>,
    /// Swept configuration field (sweep benchmarks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim_key: Option<String>,
    /// Values for `dim_key` (sweep benchmarks only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dim_values: Vec<ParamValue>,
    /// Playbook run at every destination before any benchmark runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_task: Option<TaskSpec>,
    /// Playbook run at every destination after all benchmarks ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_task: Option<TaskSpec>,
}

impl BenchmarkSpec {
    /// Minimal spec, mostly useful in tests and programmatic setups
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            repetitions: default_repetitions(),
            destinations: Vec::new(),
            dd: None,
            dim_key: None,
            dim_values: Vec::new(),
            pre_task: None,
            post_task: None,
        }
    }

    /// Decode a single benchmark table.
    ///
    /// Entries are decoded one by one so that a malformed entry is reported
    /// against its own name and does not hide the others.
    pub fn from_toml(value: toml::Value) -> Result<Self> {
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unnamed>")
            .to_string();
        BenchmarkSpec::deserialize(value)
            .map_err(|e| BenchError::config_for(&name, e.to_string().trim_end()))
    }
}

/// A hook playbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    pub playbook: String,
}

/// A sweep value as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}
