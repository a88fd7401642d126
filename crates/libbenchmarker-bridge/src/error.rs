use libbenchmarker_core::BenchError;
use thiserror::Error;

/// Errors raised while talking to Ansible or writing exported points
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The executor program could not be started
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The playbook ran but reported failure
    #[error("playbook {playbook} failed on {host} ({status}): {output}")]
    PlaybookFailed {
        playbook: String,
        host: String,
        status: String,
        output: String,
    },

    #[error("playbook {playbook} timed out on {host} after {secs}s")]
    Timeout {
        playbook: String,
        host: String,
        secs: u64,
    },

    /// A point that cannot be expressed in line protocol
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BridgeError> for BenchError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Io(e) => BenchError::Io(e),
            other => BenchError::Execution(other.to_string()),
        }
    }
}
