use libbenchmarker_core::BenchError;
use serde::Serialize;

use crate::cli::Cli;

/// JSON response envelope
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
}

fn print_json<T: Serialize>(value: &T, to_stderr: bool) {
    match serde_json::to_string_pretty(value) {
        Ok(json) if to_stderr => eprintln!("{}", json),
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("error: failed to serialize output: {}", e),
    }
}

/// Output a result; in human mode `human` is printed instead
pub fn output_success<T: Serialize>(cli: &Cli, data: T, human: impl FnOnce(&T)) {
    if cli.json {
        let response = JsonResponse {
            schema_version: 1,
            ok: true,
            data: Some(data),
            error: None,
        };
        print_json(&response, false);
    } else {
        human(&data);
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &BenchError) {
    if cli.json {
        let response: JsonResponse<()> = JsonResponse {
            schema_version: 1,
            ok: false,
            data: None,
            error: Some(JsonError {
                code: err.error_code().to_string(),
                message: err.to_string(),
            }),
        };
        print_json(&response, true);
    } else {
        eprintln!("error: {}", err);
    }
}
