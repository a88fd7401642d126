use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Temporary directory holding the result artifacts of one invocation.
///
/// Everything below it is removed when the value is dropped, whether or not
/// the benchmarks succeeded.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("benchmarker-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the artifact for one repetition.
    ///
    /// Distinct (benchmark, key, repetition) triples always map to distinct
    /// file names.
    pub fn artifact_path(&self, benchmark: &str, key: &str, repetition: usize) -> PathBuf {
        self.dir
            .path()
            .join(self.artifact_name(benchmark, key, repetition))
    }

    /// File name part of [`artifact_path`](Self::artifact_path)
    pub fn artifact_name(&self, benchmark: &str, key: &str, repetition: usize) -> String {
        artifact_file_name(benchmark, key, repetition)
    }

    /// Remove the directory now, reporting any IO error
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

fn artifact_file_name(benchmark: &str, key: &str, repetition: usize) -> String {
    format!(
        "{}_{}_{}.json",
        encode_component(benchmark),
        encode_component(key),
        repetition
    )
}

// Percent-encodes everything except [A-Za-z0-9.-], so '_' only ever appears
// as a separator.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
