//! Build command implementations (build, clean)

use std::path::Path;
use std::process::ExitCode;

use super::{load_context, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{reporter_for, BuildError, BuildPipeline, BuildResult, Ledger};
use crate::codec::GritBackend;
use crate::config::loader::CliOverrides;
use crate::config::ProgressFormat;

/// Print the outcome of one build when no progress reporter did.
fn print_result(result: &Result<BuildResult, BuildError>, format: ProgressFormat) {
    match result {
        Ok(result) if format == ProgressFormat::None => {
            let summary = result.summary();
            if summary.is_empty() {
                return;
            }
            if result.is_success() {
                println!("{}", summary);
            } else {
                eprintln!("{}", summary);
            }
        }
        Ok(_) => {}
        Err(e) => eprintln!("Build error: {}", e),
    }
}

/// Run the build command
pub fn run_build(
    config_path: Option<&Path>,
    overrides: CliOverrides,
    force: bool,
    watch: bool,
    verbose: bool,
) -> ExitCode {
    let context = match load_context(config_path, overrides) {
        Ok(context) => context.with_force(force).with_verbose(verbose),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let format = context.config().build.progress;
    let watch_config = context.config().watch.clone();
    let backend = GritBackend::new(context.codec_program());
    let reporter = reporter_for(format, verbose);
    let pipeline = BuildPipeline::new(context, &backend, &*reporter);

    if watch {
        eprintln!("Watching for changes, press Ctrl+C to stop");
        let outcome = crate::watch::watch_and_rebuild(&pipeline, &watch_config, |result, fixed| {
            for name in fixed {
                eprintln!("Fixed: {}", name);
            }
            print_result(&result, format);
        });

        return match outcome {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("Watch error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let result = pipeline.build();
    print_result(&result, format);
    match result {
        Ok(result) => ExitCode::from(result.exit_code()),
        Err(_) => ExitCode::from(EXIT_ERROR),
    }
}

/// Run the clean command
pub fn run_clean(config_path: Option<&Path>, overrides: CliOverrides) -> ExitCode {
    let context = match load_context(config_path, overrides) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let ledger = Ledger::new(context.out_dir());
    match ledger.clear() {
        Ok(removed) => {
            println!("Removed {} marker(s) from {}", removed, ledger.dir().display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
