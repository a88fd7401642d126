use std::path::{Path, PathBuf};
use std::sync::Arc;

use libbenchmarker_bridge::{AnsibleConfig, AnsibleExecutor};
use libbenchmarker_core::export::DEFAULT_RESULTS_FILE;
use libbenchmarker_core::{BenchError, BenchmarkContext};
use serde::Deserialize;

/// Contents of `benchmarker.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Where the results document goes
    #[serde(default)]
    pub results_file: Option<PathBuf>,
    #[serde(default)]
    pub ansible: AnsibleConfig,
    /// Benchmark tables, decoded one at a time by the core
    #[serde(default)]
    pub benchmarks: Vec<toml::Value>,
}

impl FileConfig {
    pub fn results_file(&self) -> PathBuf {
        self.results_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILE))
    }

    /// Context backed by `ansible-playbook`
    pub fn context(&self) -> BenchmarkContext {
        BenchmarkContext::new(Arc::new(AnsibleExecutor::new(self.ansible.clone())))
    }
}

/// Load the configuration file
pub fn load_config(path: &Path) -> Result<FileConfig, BenchError> {
    if !path.exists() {
        return Err(BenchError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchmarker.toml");
        std::fs::write(
            &path,
            r#"
results_file = "out/results.json"

[ansible]
playbook_dir = "pb"
user = "centos"

[[benchmarks]]
name = "dd"
type = "DdFixedParams"
destinations = [{ name = "nfs", host = "10.0.0.5", target_folder = "/mnt/nfs" }]

[[benchmarks]]
name = "broken"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.results_file(), PathBuf::from("out/results.json"));
        assert_eq!(config.ansible.playbook_dir, PathBuf::from("pb"));
        assert_eq!(config.benchmarks.len(), 2);
    }

    #[test]
    fn test_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.results_file(), PathBuf::from("results.json"));
        assert!(config.benchmarks.is_empty());
    }

    #[test]
    fn test_unknown_top_level_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchmarker.toml");
        std::fs::write(&path, "[influxdb]\nhost = \"x\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("config file not found"));
    }
}
