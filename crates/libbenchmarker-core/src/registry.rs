//! Mapping from configured type names to benchmark constructors

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::benchmark::{Benchmark, BenchmarkContext, DdFixedParams, DdOneDimParams};
use crate::config::BenchmarkSpec;
use crate::error::{BenchError, Result};

/// Constructor of a benchmark type
pub type BenchmarkFactory = fn(&BenchmarkSpec, &BenchmarkContext) -> Result<Box<dyn Benchmark>>;

/// Every benchmark type shipped with the crate
pub static BUILTIN_BENCHMARKS: &[(&str, BenchmarkFactory)] = &[
    (DdFixedParams::TYPE_NAME, DdFixedParams::build),
    (DdOneDimParams::TYPE_NAME, DdOneDimParams::build),
];

/// Registry of benchmark types
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRegistry {
    factories: BTreeMap<String, BenchmarkFactory>,
}

impl BenchmarkRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`BUILTIN_BENCHMARKS`]
    pub fn builtin() -> Self {
        let factories = BUILTIN_BENCHMARKS
            .iter()
            .map(|(name, factory)| (name.to_string(), *factory))
            .collect();
        Self { factories }
    }

    /// Add a benchmark type; names must be unique
    pub fn register(&mut self, type_name: &str, factory: BenchmarkFactory) -> Result<()> {
        if self.factories.contains_key(type_name) {
            return Err(BenchError::DuplicateBenchmarkType(type_name.to_string()));
        }
        self.factories.insert(type_name.to_string(), factory);
        Ok(())
    }

    pub fn resolve(&self, type_name: &str) -> Result<BenchmarkFactory> {
        self.factories.get(type_name).copied().ok_or_else(|| {
            BenchError::Config(format!(
                "unknown benchmark type '{}' (known: {})",
                type_name,
                self.type_names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Resolve `spec.kind` and construct the benchmark
    pub fn construct(&self, spec: &BenchmarkSpec, ctx: &BenchmarkContext) -> Result<Box<dyn Benchmark>> {
        let factory = self
            .resolve(&spec.kind)
            .map_err(|e| match e {
                BenchError::Config(msg) => BenchError::config_for(&spec.name, msg),
                other => other,
            })?;
        factory(spec, ctx)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Process-wide registry of the built-in benchmark types
pub fn registry() -> &'static BenchmarkRegistry {
    static REGISTRY: OnceLock<BenchmarkRegistry> = OnceLock::new();
    REGISTRY.get_or_init(BenchmarkRegistry::builtin)
}
