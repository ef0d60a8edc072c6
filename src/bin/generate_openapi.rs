//! Emits the service's OpenAPI document.
//!
//! Usage:
//!   cargo run --bin generate_openapi                      # to stdout
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{env, fs, process};

use smart_irrigation_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialise OpenAPI spec");

    let mut args = env::args().skip(1);
    let output = match (args.next().as_deref(), args.next()) {
        (Some("--output"), Some(path)) => Some(path),
        (None, _) => None,
        _ => {
            eprintln!("usage: generate_openapi [--output <path>]");
            process::exit(2);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                eprintln!("Error writing to {path}: {e}");
                process::exit(1);
            }
            eprintln!("OpenAPI spec written to {path}");
        }
        None => println!("{json}"),
    }
}
