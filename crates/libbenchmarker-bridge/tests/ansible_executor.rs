//! Runs the executor against shell scripts standing in for playbooks.
//!
//! With `program = "sh"` the playbook path becomes the script to run and the
//! remaining ansible arguments become its positional parameters.
#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use libbenchmarker_bridge::{AnsibleConfig, AnsibleExecutor};
use libbenchmarker_core::{BenchError, Parameters, RemoteExecutor, RemoteTask};
use tempfile::tempdir;

fn executor(dir: &Path, timeout_secs: Option<u64>) -> AnsibleExecutor {
    AnsibleExecutor::new(AnsibleConfig {
        playbook_dir: dir.to_path_buf(),
        timeout_secs,
        program: "sh".to_string(),
        ..AnsibleConfig::default()
    })
}

fn params() -> Parameters {
    let mut params = Parameters::new();
    params.insert("dd_dir".to_string(), "/mnt/nfs".to_string());
    params
}

#[test]
fn test_successful_playbook() {
    let dir = tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    std::fs::write(
        dir.path().join("ok.yml"),
        format!("echo \"$@\" > '{}'\n", args_file.display()),
    )
    .unwrap();

    executor(dir.path(), None)
        .execute(&RemoteTask::new("ok.yml"), "10.0.0.5", &params())
        .unwrap();

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.trim_end(),
        r#"--inventory 10.0.0.5, --extra-vars {"dd_dir":"/mnt/nfs"}"#
    );
}

#[test]
fn test_failure_reports_stderr() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("fail.yml"),
        "echo 'PLAY [all]'\necho 'fatal: disk full' >&2\nexit 2\n",
    )
    .unwrap();

    let err = executor(dir.path(), None)
        .execute(&RemoteTask::new("fail.yml"), "storage1", &params())
        .unwrap_err();

    assert!(matches!(err, BenchError::Execution(_)));
    let msg = err.to_string();
    assert!(msg.contains("fail.yml failed on storage1"));
    assert!(msg.contains("fatal: disk full"));
    assert!(!msg.contains("PLAY [all]"));
}

#[test]
fn test_failure_falls_back_to_stdout() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("fail.yml"),
        "echo 'fatal: [storage1]: FAILED! => {\"rc\": 1}'\nexit 1\n",
    )
    .unwrap();

    let err = executor(dir.path(), None)
        .execute(&RemoteTask::new("fail.yml"), "storage1", &params())
        .unwrap_err();
    assert!(err.to_string().contains("FAILED!"));
}

#[test]
fn test_timeout_kills_playbook() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("slow.yml"), "exec sleep 30\n").unwrap();

    let start = Instant::now();
    let err = executor(dir.path(), Some(1))
        .execute(&RemoteTask::new("slow.yml"), "storage1", &params())
        .unwrap_err();

    assert!(matches!(err, BenchError::Execution(_)));
    assert!(err.to_string().contains("timed out"));
    assert!(start.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_lingering_child_does_not_block() {
    // The backgrounded sleep inherits and holds both output pipes
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("detach.yml"),
        "echo 'fatal: agent left running' >&2\nsleep 30 &\nexit 3\n",
    )
    .unwrap();

    let start = Instant::now();
    let err = executor(dir.path(), None)
        .execute(&RemoteTask::new("detach.yml"), "storage1", &params())
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(20));
    assert!(err.to_string().contains("fatal: agent left running"));

    let start = Instant::now();
    std::fs::write(dir.path().join("detach_ok.yml"), "sleep 30 &\n").unwrap();
    executor(dir.path(), None)
        .execute(&RemoteTask::new("detach_ok.yml"), "storage1", &params())
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_missing_program() {
    let dir = tempdir().unwrap();
    let executor = AnsibleExecutor::new(AnsibleConfig {
        playbook_dir: dir.path().to_path_buf(),
        program: "/nonexistent/ansible-playbook".to_string(),
        ..AnsibleConfig::default()
    });

    let err = executor
        .execute(&RemoteTask::new("run.yml"), "h", &Parameters::new())
        .unwrap_err();
    assert!(err.to_string().contains("failed to launch /nonexistent/ansible-playbook"));
}

#[test]
fn test_config_from_toml() {
    let config: AnsibleConfig = toml::from_str(
        r#"
        playbook_dir = "/srv/playbooks"
        user = "centos"
        timeout_secs = 3600
        "#,
    )
    .unwrap();
    assert_eq!(config.playbook_dir, Path::new("/srv/playbooks"));
    assert_eq!(config.user.as_deref(), Some("centos"));
    assert_eq!(config.timeout(), Some(Duration::from_secs(3600)));
    assert_eq!(config.program, "ansible-playbook");
}
