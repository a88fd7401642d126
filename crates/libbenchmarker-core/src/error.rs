use thiserror::Error;

/// Main error type for benchmarker operations
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid or missing configuration, detected before any remote call
    #[error("configuration error: {0}")]
    Config(String),

    /// The remote-execution bridge reported a failure
    #[error("execution error: {0}")]
    Execution(String),

    /// A result artifact was missing after a successful remote call
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("benchmark type '{0}' is already registered")]
    DuplicateBenchmarkType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl BenchError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            BenchError::Config(_) => "config_error",
            BenchError::Execution(_) => "execution_error",
            BenchError::Artifact(_) => "artifact_error",
            BenchError::DuplicateBenchmarkType(_) => "internal_error",
            BenchError::Io(_) => "io_error",
            BenchError::Json(_) => "internal_error",
            BenchError::TomlParse(_) => "config_error",
        }
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::Config(_) => 2,
            BenchError::TomlParse(_) => 2,
            BenchError::Execution(_) => 3,
            BenchError::Artifact(_) => 3,
            BenchError::Io(_) => 5,
            _ => 1,
        }
    }

    /// Whether the error was raised while validating configuration
    pub fn is_config(&self) -> bool {
        matches!(self, BenchError::Config(_) | BenchError::TomlParse(_))
    }

    /// Create a Config error for a specific benchmark
    pub fn config_for(benchmark: &str, msg: impl std::fmt::Display) -> Self {
        BenchError::Config(format!("{}: {}", benchmark, msg))
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
