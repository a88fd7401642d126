use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// A POSIX target a benchmark runs against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Destination {
    /// Unique label within the owning benchmark; used as a grouping key
    pub name: String,
    /// Host the remote task is executed at
    pub host: String,
    /// Directory on the host the benchmark writes into
    pub target_folder: String,
}

impl Destination {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        target_folder: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            target_folder: target_folder.into(),
        }
    }

    /// Check that every addressing attribute is present
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BenchError::Config("destination name must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(BenchError::Config(format!(
                "destination '{}' has an empty host",
                self.name
            )));
        }
        if self.target_folder.trim().is_empty() {
            return Err(BenchError::Config(format!(
                "destination '{}' has an empty target_folder",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_from_toml() {
        let dest: Destination = toml::from_str(
            r#"
            name = "nfs"
            host = "10.0.0.5"
            target_folder = "/mnt/nfs"
            "#,
        )
        .unwrap();

        assert_eq!(dest, Destination::new("nfs", "10.0.0.5", "/mnt/nfs"));
        assert!(dest.validate().is_ok());
    }

    #[test]
    fn test_destination_rejects_unknown_keys() {
        let result: std::result::Result<Destination, _> = toml::from_str(
            r#"
            name = "nfs"
            host = "10.0.0.5"
            target_folder = "/mnt/nfs"
            port = 22
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_destination_empty_host_is_invalid() {
        let dest = Destination::new("nfs", " ", "/mnt/nfs");
        let err = dest.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("empty host"));
    }
}
