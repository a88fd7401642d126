//! Collaborators of the benchmarker core
//!
//! - [`AnsibleExecutor`]: runs benchmark playbooks with `ansible-playbook`
//! - [`LineProtocolWriter`]: writes exported points as InfluxDB line protocol

pub mod ansible;
pub mod error;
pub mod influx;

pub use ansible::{AnsibleConfig, AnsibleExecutor};
pub use error::BridgeError;
pub use influx::{format_line, LineProtocolWriter};
