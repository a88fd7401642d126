use libbenchmarker_core::{registry, BenchError};
use serde::Serialize;

use crate::cli::Cli;
use crate::output::output_success;

#[derive(Serialize)]
struct TypesOutput {
    types: Vec<String>,
}

pub fn run(cli: &Cli) -> Result<(), BenchError> {
    let types = registry().type_names().map(str::to_string).collect();
    output_success(cli, TypesOutput { types }, |out| {
        for name in &out.types {
            println!("{}", name);
        }
    });
    Ok(())
}
