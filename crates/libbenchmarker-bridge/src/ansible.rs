//! Remote execution through `ansible-playbook`

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use libbenchmarker_core::{Parameters, RemoteExecutor, RemoteTask, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BridgeError;

/// Program invoked when none is configured
pub const DEFAULT_PROGRAM: &str = "ansible-playbook";

/// Lines of output kept in a failure message
const OUTPUT_TAIL_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long output readers may lag behind the exit of the playbook
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

fn default_playbook_dir() -> PathBuf {
    PathBuf::from("playbooks")
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

/// `[ansible]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnsibleConfig {
    /// Directory holding the playbooks
    #[serde(default = "default_playbook_dir")]
    pub playbook_dir: PathBuf,
    /// Inventory file; hosts are then selected with `--limit`
    #[serde(default)]
    pub inventory: Option<PathBuf>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    /// Kill a playbook that runs longer than this
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Executable to run instead of `ansible-playbook`
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for AnsibleConfig {
    fn default() -> Self {
        Self {
            playbook_dir: default_playbook_dir(),
            inventory: None,
            user: None,
            private_key: None,
            timeout_secs: None,
            program: default_program(),
        }
    }
}

impl AnsibleConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Runs each task as one `ansible-playbook` invocation against one host
#[derive(Debug, Clone, Default)]
pub struct AnsibleExecutor {
    config: AnsibleConfig,
}

impl AnsibleExecutor {
    pub fn new(config: AnsibleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnsibleConfig {
        &self.config
    }

    /// Command line for running `task` on `host` with `parameters` as extra vars
    pub fn build_command(
        &self,
        task: &RemoteTask,
        host: &str,
        parameters: &Parameters,
    ) -> std::result::Result<Command, BridgeError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg(self.config.playbook_dir.join(&task.playbook));

        match self.config.inventory {
            Some(ref inventory) => {
                cmd.arg("--inventory").arg(inventory);
                cmd.arg("--limit").arg(host);
            }
            // Trailing comma makes ansible read the argument as a host list
            None => {
                cmd.arg("--inventory").arg(format!("{},", host));
            }
        }

        if let Some(ref user) = self.config.user {
            cmd.arg("--user").arg(user);
        }
        if let Some(ref key) = self.config.private_key {
            cmd.arg("--private-key").arg(key);
        }

        cmd.arg("--extra-vars").arg(serde_json::to_string(parameters)?);
        Ok(cmd)
    }

    fn run_playbook(
        &self,
        task: &RemoteTask,
        host: &str,
        parameters: &Parameters,
    ) -> std::result::Result<(), BridgeError> {
        let mut cmd = self.build_command(task, host, parameters)?;
        debug!("Running {:?}", cmd);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.config.timeout() {
            Some(timeout) => match wait_timeout(&mut child, timeout)? {
                Some(status) => status,
                None => {
                    // Readers are left detached; remote children may still hold the pipes
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BridgeError::Timeout {
                        playbook: task.playbook.clone(),
                        host: host.to_string(),
                        secs: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        // Processes left behind by the playbook may keep the pipes open
        let deadline = Instant::now() + OUTPUT_GRACE;
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);
        debug!("{} on {} finished: {}", task.playbook, host, status);

        if status.success() {
            return Ok(());
        }

        // ansible-playbook reports task failures on stdout
        let output = if stderr.trim().is_empty() { &stdout } else { &stderr };
        Err(BridgeError::PlaybookFailed {
            playbook: task.playbook.clone(),
            host: host.to_string(),
            status: status.to_string(),
            output: tail(output, OUTPUT_TAIL_LINES),
        })
    }
}

impl RemoteExecutor for AnsibleExecutor {
    fn execute(&self, task: &RemoteTask, host: &str, parameters: &Parameters) -> Result<()> {
        Ok(self.run_playbook(task, host, parameters)?)
    }
}

/// Poll until the child exits; `None` once `timeout` has passed
fn wait_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Output of a child pipe, filled by a background thread
struct OutputReader {
    buf: Arc<Mutex<Vec<u8>>>,
    /// Disconnects once the pipe reaches end of file
    done: Receiver<()>,
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> OutputReader {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (tx, done) = mpsc::channel::<()>();
    let shared = Arc::clone(&buf);
    thread::spawn(move || {
        let _tx = tx;
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
            }
        }
    });
    OutputReader { buf, done }
}

/// Whatever the reader has gathered by end of file or `deadline`
fn collect(reader: Option<OutputReader>, deadline: Instant) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    let wait = deadline.saturating_duration_since(Instant::now());
    if let Err(mpsc::RecvTimeoutError::Timeout) = reader.done.recv_timeout(wait) {
        debug!("Output pipe still open after playbook exit; using partial output");
    }
    let buf = reader.buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Last `n` non-empty lines of `output`, joined with newlines
fn tail(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn params() -> Parameters {
        let mut params = Parameters::new();
        params.insert("dd_dir".to_string(), "/mnt/nfs".to_string());
        params.insert("dd_blocksize".to_string(), "1M".to_string());
        params
    }

    #[test]
    fn test_inline_inventory() {
        let executor = AnsibleExecutor::default();
        let cmd = executor
            .build_command(&RemoteTask::new("run_dd_benchmark.yml"), "10.0.0.5", &params())
            .unwrap();

        assert_eq!(cmd.get_program(), DEFAULT_PROGRAM);
        assert_eq!(
            args(&cmd),
            vec![
                "playbooks/run_dd_benchmark.yml",
                "--inventory",
                "10.0.0.5,",
                "--extra-vars",
                r#"{"dd_blocksize":"1M","dd_dir":"/mnt/nfs"}"#,
            ]
        );
    }

    #[test]
    fn test_configured_inventory_and_credentials() {
        let executor = AnsibleExecutor::new(AnsibleConfig {
            playbook_dir: PathBuf::from("/opt/pb"),
            inventory: Some(PathBuf::from("hosts.ini")),
            user: Some("centos".to_string()),
            private_key: Some(PathBuf::from("/keys/id_rsa")),
            ..AnsibleConfig::default()
        });
        let cmd = executor
            .build_command(&RemoteTask::new("prepare.yml"), "storage1", &Parameters::new())
            .unwrap();

        assert_eq!(
            args(&cmd),
            vec![
                "/opt/pb/prepare.yml",
                "--inventory",
                "hosts.ini",
                "--limit",
                "storage1",
                "--user",
                "centos",
                "--private-key",
                "/keys/id_rsa",
                "--extra-vars",
                "{}",
            ]
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AnsibleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnsibleConfig::default());
        assert_eq!(config.timeout(), None);
        assert!(serde_json::from_str::<AnsibleConfig>(r#"{"hosts": "x"}"#).is_err());
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let output = "one\n\ntwo\nthree\n  \nfour\n";
        assert_eq!(tail(output, 2), "three\nfour");
        assert_eq!(tail(output, 10), "one\ntwo\nthree\nfour");
        assert_eq!(tail("", 3), "");
    }
}
