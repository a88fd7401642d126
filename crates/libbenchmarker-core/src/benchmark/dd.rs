//! Benchmarks driving `dd` on remote destinations

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{base_tags, validate_destinations, Benchmark, BenchmarkBase, BenchmarkContext};
use crate::bridge::{Parameters, RemoteTask};
use crate::config::BenchmarkSpec;
use crate::error::{BenchError, Result};
use crate::parse::parse_result_file;
use crate::scratch::ScratchSpace;
use crate::types::{BenchmarkResults, Destination, RunResult, Tags};

/// Playbook performing a single dd run
pub const RUN_DD_PLAYBOOK: &str = "run_dd_benchmark.yml";

/// Canonical dd parameters of a benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdConfig {
    pub blocksize: String,
    pub blockcount: String,
}

impl Default for DdConfig {
    fn default() -> Self {
        Self {
            blocksize: "1G".to_string(),
            blockcount: "1".to_string(),
        }
    }
}

/// User-supplied dd settings; unset fields keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DdConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocksize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockcount: Option<String>,
}

/// A field of [`DdConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DdField {
    Blocksize,
    Blockcount,
}

impl DdField {
    pub const ALL: [DdField; 2] = [DdField::Blocksize, DdField::Blockcount];

    pub fn as_str(&self) -> &'static str {
        match self {
            DdField::Blocksize => "blocksize",
            DdField::Blockcount => "blockcount",
        }
    }
}

impl fmt::Display for DdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DdField {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        DdField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = DdField::ALL.iter().map(|f| f.as_str()).collect();
                BenchError::Config(format!(
                    "'{}' is not a dd config property (valid: {})",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

fn blocksize_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[1-9][0-9]*(c|w|b|kB|[KMGTPEZY](B|iB)?)?$").expect("blocksize pattern is valid")
    })
}

/// Check that `value` is acceptable for `field` without building a config
pub fn validate_field_value(field: DdField, value: &str) -> Result<()> {
    let ok = match field {
        DdField::Blocksize => blocksize_pattern().is_match(value),
        DdField::Blockcount => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
    };
    if ok {
        Ok(())
    } else {
        Err(BenchError::Config(format!(
            "invalid value '{}' for dd property '{}'",
            value, field
        )))
    }
}

impl DdConfig {
    /// Apply overrides field by field
    pub fn merge(mut self, overrides: &DdConfigOverrides) -> Self {
        if let Some(ref blocksize) = overrides.blocksize {
            self.blocksize = blocksize.clone();
        }
        if let Some(ref blockcount) = overrides.blockcount {
            self.blockcount = blockcount.clone();
        }
        self
    }

    pub fn get(&self, field: DdField) -> &str {
        match field {
            DdField::Blocksize => &self.blocksize,
            DdField::Blockcount => &self.blockcount,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for field in DdField::ALL {
            validate_field_value(field, self.get(field))?;
        }
        Ok(())
    }

    /// Copy of this config with one field replaced, validated first
    pub fn with_value(&self, field: DdField, value: &str) -> Result<Self> {
        validate_field_value(field, value)?;
        let mut config = self.clone();
        match field {
            DdField::Blocksize => config.blocksize = value.to_string(),
            DdField::Blockcount => config.blockcount = value.to_string(),
        }
        Ok(config)
    }

    /// Parameters as passed to the playbook, `dd_` prefixed
    pub fn parameters(&self) -> impl Iterator<Item = (String, String)> + '_ {
        DdField::ALL
            .into_iter()
            .map(move |field| (format!("dd_{}", field), self.get(field).to_string()))
    }
}

/// Run dd with one fixed configuration on every destination
pub struct DdFixedParams {
    base: BenchmarkBase,
    destinations: Vec<Destination>,
    config: DdConfig,
    run_task: RemoteTask,
}

impl DdFixedParams {
    pub const TYPE_NAME: &'static str = "DdFixedParams";

    pub fn new(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Self> {
        if spec.dim_key.is_some() || !spec.dim_values.is_empty() {
            return Err(BenchError::config_for(
                &spec.name,
                format!(
                    "'dim_key'/'dim_values' are only valid for {}",
                    DdOneDimParams::TYPE_NAME
                ),
            ));
        }
        Self::configure(spec, ctx)
    }

    pub fn build(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Box<dyn Benchmark>> {
        Ok(Box::new(Self::new(spec, ctx)?))
    }

    fn configure(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Self> {
        let base = BenchmarkBase::new(spec, ctx)?;

        let config = match spec.dd {
            Some(ref overrides) => DdConfig::default().merge(overrides),
            None => DdConfig::default(),
        };
        config.validate().map_err(|e| match e {
            BenchError::Config(msg) => BenchError::config_for(&spec.name, msg),
            other => other,
        })?;

        let destinations = validate_destinations(spec)?;

        Ok(Self {
            base,
            destinations,
            config,
            run_task: RemoteTask::new(RUN_DD_PLAYBOOK),
        })
    }

    pub fn config(&self) -> &DdConfig {
        &self.config
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn repetitions(&self) -> usize {
        self.base.repetitions
    }

    /// All repetitions for one grouping key; nothing is returned unless
    /// every repetition succeeded
    fn run_group(
        &self,
        scratch: &ScratchSpace,
        key: &str,
        dest: &Destination,
        config: &DdConfig,
    ) -> Result<Vec<RunResult>> {
        let repetitions = self.base.repetitions;
        let mut runs = Vec::with_capacity(repetitions);
        for i in 0..repetitions {
            info!("Run {} of {}", i + 1, repetitions);
            let file_name = scratch.artifact_name(&self.base.name, key, i);
            let result = self.run_at(scratch.path(), &file_name, dest, config)?;
            runs.push(result);
        }
        Ok(runs)
    }

    /// Perform a single run
    fn run_at(
        &self,
        controller_dir: &Path,
        result_file: &str,
        dest: &Destination,
        config: &DdConfig,
    ) -> Result<RunResult> {
        let mut params = Parameters::new();
        params.insert("dd_dir".to_string(), dest.target_folder.clone());
        params.insert("dd_result_file".to_string(), result_file.to_string());
        params.insert(
            "controller_dir".to_string(),
            controller_dir.to_string_lossy().to_string(),
        );
        params.extend(config.parameters());

        let start = Instant::now();
        self.base
            .executor
            .execute(&self.run_task, &dest.host, &params)?;
        let runtime = start.elapsed().as_secs_f64();

        let metrics = parse_result_file(&controller_dir.join(result_file))?;
        info!("Run took {:.2} s", runtime);

        Ok(RunResult::new(metrics, runtime))
    }
}

impl Benchmark for DdFixedParams {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn run_pre_task(&mut self) -> Result<()> {
        self.base
            .run_hook(self.base.pre_task.as_ref(), &self.destinations)
    }

    /// Run dd on each destination
    fn run(&mut self, scratch: &ScratchSpace) -> Result<()> {
        self.base.results.clear();
        for dest in &self.destinations {
            info!("Start {} for {}", self.base.name, dest.name);
            let runs = self.run_group(scratch, &dest.name, dest, &self.config)?;
            self.base.results.commit(dest.name.clone(), runs);
        }
        Ok(())
    }

    fn run_post_task(&mut self) -> Result<()> {
        self.base
            .run_hook(self.base.post_task.as_ref(), &self.destinations)
    }

    fn results(&self) -> &BenchmarkResults {
        &self.base.results
    }
}

/// Run dd with multiple values for a single dimension
pub struct DdOneDimParams {
    inner: DdFixedParams,
    dim_key: DdField,
    /// Swept values with their derived configurations, in declared order
    sweep: Vec<(String, DdConfig)>,
}

impl DdOneDimParams {
    pub const TYPE_NAME: &'static str = "DdOneDimParams";

    pub fn new(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Self> {
        let inner = DdFixedParams::configure(spec, ctx)?;
        let name = spec.name.as_str();

        if inner.destinations.len() != 1 {
            return Err(BenchError::config_for(
                name,
                "a single destination is required",
            ));
        }

        let dim_key = match spec.dim_key.as_deref() {
            None | Some("") => {
                return Err(BenchError::config_for(
                    name,
                    "property 'dim_key' (str) is missing, must be a valid dd config property name",
                ))
            }
            Some(key) => key.parse::<DdField>().map_err(|e| match e {
                BenchError::Config(msg) => BenchError::config_for(name, msg),
                other => other,
            })?,
        };

        if spec.dim_values.is_empty() {
            return Err(BenchError::config_for(
                name,
                "property 'dim_values' (list) is missing, must be a list of values for 'dim_key'",
            ));
        }

        // Every value is checked before anything runs
        let mut sweep: Vec<(String, DdConfig)> = Vec::with_capacity(spec.dim_values.len());
        for value in &spec.dim_values {
            let value = value.to_string();
            if sweep.iter().any(|(v, _)| *v == value) {
                return Err(BenchError::config_for(
                    name,
                    format!("duplicate value '{}' in 'dim_values'", value),
                ));
            }
            let config = inner.config.with_value(dim_key, &value).map_err(|e| match e {
                BenchError::Config(msg) => BenchError::config_for(name, msg),
                other => other,
            })?;
            sweep.push((value, config));
        }

        Ok(Self {
            inner,
            dim_key,
            sweep,
        })
    }

    pub fn build(spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Box<dyn Benchmark>> {
        Ok(Box::new(Self::new(spec, ctx)?))
    }

    pub fn dim_key(&self) -> DdField {
        self.dim_key
    }

    pub fn dim_values(&self) -> impl Iterator<Item = &str> {
        self.sweep.iter().map(|(value, _)| value.as_str())
    }
}

impl Benchmark for DdOneDimParams {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn run_pre_task(&mut self) -> Result<()> {
        self.inner.run_pre_task()
    }

    /// Run dd once per swept value on the single destination
    fn run(&mut self, scratch: &ScratchSpace) -> Result<()> {
        self.inner.base.results.clear();
        let dest = &self.inner.destinations[0];
        for (value, config) in &self.sweep {
            info!("Run with {} set to {}", self.dim_key, value);
            let runs = self.inner.run_group(scratch, value, dest, config)?;
            self.inner.base.results.commit(value.clone(), runs);
        }
        Ok(())
    }

    fn run_post_task(&mut self) -> Result<()> {
        self.inner.run_post_task()
    }

    fn results(&self) -> &BenchmarkResults {
        self.inner.results()
    }

    fn tags(&self) -> Tags {
        let mut tags = base_tags(self.name(), self.type_name());
        tags.insert("dim_key".to_string(), self.dim_key.to_string());
        tags.insert(
            "dim_values".to_string(),
            self.dim_values().collect::<Vec<_>>().join(","),
        );
        tags
    }
}
