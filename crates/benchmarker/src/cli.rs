use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "benchmarker", about = "Run storage benchmarks on remote hosts", version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "benchmarker.toml")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every configured benchmark
    Run {
        /// Results document (overrides `results_file`)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Also write every run as InfluxDB line protocol to this file
        #[arg(long)]
        line_protocol: Option<PathBuf>,

        /// Do not write the results document
        #[arg(long)]
        no_save: bool,
    },

    /// Check the configuration without running anything
    Validate,

    /// List the available benchmark types
    Types,
}
