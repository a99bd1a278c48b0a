//! Check command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{load_context, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{discover_items, failure_line};
use crate::compile::prepare_item;
use crate::config::loader::CliOverrides;

/// Run the check command
///
/// Discovers, decodes and validates every item. The codec is never run.
pub fn run_check(config_path: Option<&Path>, overrides: CliOverrides) -> ExitCode {
    let context = match load_context(config_path, overrides) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let items = match discover_items(&context.folders()) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let out_dir = context.out_dir();
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        eprintln!("Error: failed to create build folder {}: {}", out_dir.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    let mut failed = 0;
    for item in &items {
        match prepare_item(item, &out_dir) {
            Ok(spec) => println!("    {}", spec),
            Err(e) => {
                failed += 1;
                eprintln!("{}", failure_line(&item.name, &e.to_string()));
            }
        }
    }

    println!("Checked {} item(s), {} failed", items.len(), failed);
    if failed == 0 {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
