//! gfxbake - Command-line graphics asset compiler

use std::process::ExitCode;

use gfxbake::cli;

fn main() -> ExitCode {
    cli::run()
}
