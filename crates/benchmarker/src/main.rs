//! benchmarker - run storage benchmarks on remote hosts and collect their results

mod cli;
mod commands;
mod config;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use libbenchmarker_core::BenchError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run_command(&cli) {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(cli: &Cli) -> Result<(), BenchError> {
    match &cli.command {
        Command::Run {
            results,
            line_protocol,
            no_save,
        } => commands::run::run(cli, results.clone(), line_protocol.clone(), *no_save),
        Command::Validate => commands::validate::run(cli),
        Command::Types => commands::types::run(cli),
    }
}
