//! CLI tool for lazygrid - translates a JSON result set into grid rows
//!
//! Usage:
//!   lazygrid_cli <payload.json> <schema.json>                       # Output JSON to stdout
//!   lazygrid_cli <payload.json> <schema.json> --pivots region,city  # Pivoted (tree) result
//!   lazygrid_cli <payload.json> <schema.json> -o out.json           # Output JSON to file
//!
//! `--tree-schema t.json` gives the table schema used to type the row pivots;
//! it defaults to the view schema.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use lazygrid::{translate, ResultPayload, Schema, TranslateOptions};

const USAGE: &str = "Usage: lazygrid_cli <payload.json> <schema.json> \
                     [--tree-schema t.json] [--pivots a,b] [-o output.json]";

fn read(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn read_schema(path: &str) -> Schema {
    match Schema::from_json_str(&read(path)) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error parsing schema {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("{USAGE}");
        process::exit(1);
    }

    let payload_path = &args[1];
    let schema_path = &args[2];
    let mut tree_schema_path = None;
    let mut pivots: Vec<String> = Vec::new();
    let mut output_path = None;

    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        let Some(value) = rest.next() else {
            eprintln!("Missing value for {flag}\n{USAGE}");
            process::exit(1);
        };
        match flag.as_str() {
            "--tree-schema" => tree_schema_path = Some(value),
            "--pivots" => {
                pivots = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "-o" => output_path = Some(value),
            other => {
                eprintln!("Unknown option {other}\n{USAGE}");
                process::exit(1);
            }
        }
    }

    let payload = match ResultPayload::from_json_str(&read(payload_path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error parsing payload {}: {}", payload_path, e);
            process::exit(1);
        }
    };
    let schema = read_schema(schema_path);
    let tree_schema = tree_schema_path.map_or_else(|| schema.clone(), |p| read_schema(p));

    let translation = translate(
        &payload,
        &schema,
        &tree_schema,
        &pivots,
        TranslateOptions::full(),
    );

    let json = match serde_json::to_string_pretty(&translation) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                process::exit(1);
            }
            eprintln!("Written: {} ({} rows)", path, translation.rows.len());
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
