use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric metrics parsed from a single artifact
pub type Metrics = BTreeMap<String, f64>;

/// Labels attached to exported points
pub type Tags = BTreeMap<String, String>;

/// Field name runtime is exported under
pub const RUNTIME_FIELD: &str = "runtime_in_s";

/// Outcome of one repetition against one grouping key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Wall-clock time around the remote call
    #[serde(rename = "runtime_in_s")]
    pub runtime_seconds: f64,
}

impl RunResult {
    pub fn new(metrics: Metrics, runtime_seconds: f64) -> Self {
        Self {
            metrics,
            runtime_seconds,
        }
    }

    /// Metrics plus runtime, as written to a time-series sink
    pub fn fields(&self) -> Metrics {
        let mut fields = self.metrics.clone();
        fields.insert(RUNTIME_FIELD.to_string(), self.runtime_seconds);
        fields
    }
}

/// Results of one benchmark, grouped by destination name or swept value.
///
/// Keys keep the order they were first committed in; runs within a key keep
/// repetition order. Serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkResults {
    groups: Vec<(String, Vec<RunResult>)>,
}

impl BenchmarkResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the runs of a grouping key
    pub fn commit(&mut self, key: impl Into<String>, runs: Vec<RunResult>) {
        let key = key.into();
        match self.groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(runs),
            None => self.groups.push((key, runs)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[RunResult]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, runs)| runs.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RunResult])> {
        self.groups.iter().map(|(k, runs)| (k.as_str(), runs.as_slice()))
    }

    /// Number of grouping keys
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of runs across all keys
    pub fn total_runs(&self) -> usize {
        self.groups.iter().map(|(_, runs)| runs.len()).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.groups.clear();
    }

    /// Per-key means of every metric and of the runtime
    pub fn summary(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|(key, runs)| GroupSummary::from_runs(key, runs))
            .collect()
    }
}

impl Serialize for BenchmarkResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (key, runs) in &self.groups {
            map.serialize_entry(key, runs)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BenchmarkResults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = BenchmarkResults;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of grouping keys to run lists")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut results = BenchmarkResults::new();
                while let Some((key, runs)) = access.next_entry::<String, Vec<RunResult>>()? {
                    results.commit(key, runs);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// Aggregate view over the runs of one grouping key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub runs: usize,
    pub mean_metrics: Metrics,
    pub mean_runtime_seconds: f64,
}

impl GroupSummary {
    fn from_runs(key: &str, runs: &[RunResult]) -> Self {
        let mut sums: Metrics = BTreeMap::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for run in runs {
            for (name, value) in &run.metrics {
                *sums.entry(name.clone()).or_insert(0.0) += value;
                *counts.entry(name.as_str()).or_insert(0) += 1;
            }
        }
        let mean_metrics = sums
            .into_iter()
            .map(|(name, sum)| {
                let n = counts.get(name.as_str()).copied().unwrap_or(1);
                (name, sum / n as f64)
            })
            .collect();

        let mean_runtime_seconds = if runs.is_empty() {
            0.0
        } else {
            runs.iter().map(|r| r.runtime_seconds).sum::<f64>() / runs.len() as f64
        };

        Self {
            key: key.to_string(),
            runs: runs.len(),
            mean_metrics,
            mean_runtime_seconds,
        }
    }
}
