//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod check;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::build::BuildContext;
use crate::config::loader::{find_config, load_config, merge_cli_overrides, project_root, CliOverrides, ConfigError};
use crate::config::ProgressFormat;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// gfxbake - Compile GBA graphics assets into item headers
#[derive(Parser)]
#[command(name = "gfxbake")]
#[command(about = "Compile BMP/PNG graphics and their JSON descriptors into GBA item headers")]
#[command(version)]
pub struct Cli {
    /// Path to gfxbake.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every stale item and write its header
    Build {
        /// Graphics folders to scan (overrides project.graphics)
        folders: Vec<PathBuf>,

        /// Build folder for headers, codec output and markers
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Codec executable
        #[arg(long)]
        grit: Option<PathBuf>,

        /// Number of parallel jobs (0 = available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Rebuild every item, ignoring the markers
        #[arg(long)]
        force: bool,

        /// Progress output: console, json or none
        #[arg(long)]
        progress: Option<ProgressFormat>,

        /// Rebuild when graphics change
        #[arg(short, long)]
        watch: bool,
    },

    /// Validate every item without running the codec
    Check {
        /// Graphics folders to scan (overrides project.graphics)
        folders: Vec<PathBuf>,

        /// Build folder (receives quantized copies of bpp_4_auto backgrounds)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Remove build markers so the next build recompiles everything
    Clean {
        /// Build folder to clean
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "gfxbake=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Make a command line path absolute against the working directory.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
}

/// Load the configuration, apply overrides and build a context.
///
/// The project root is the directory holding `gfxbake.toml`, or the working
/// directory when there is none.
pub(crate) fn load_context(config_path: Option<&Path>, overrides: CliOverrides) -> Result<BuildContext, ConfigError> {
    let config_path = match config_path {
        Some(path) => Some(absolutize(path)),
        None => find_config(),
    };

    let (mut config, project_root) = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using config");
            let config = load_config(Some(&path))?;
            let root = project_root(&path).map(Path::to_path_buf).unwrap_or_else(|| absolutize(Path::new(".")));
            (config, root)
        }
        None => {
            tracing::debug!("no gfxbake.toml found, using defaults");
            (load_config(None)?, absolutize(Path::new(".")))
        }
    };

    let overrides = CliOverrides {
        graphics: overrides.graphics.map(|folders| folders.iter().map(|f| absolutize(f)).collect()),
        build: overrides.build.as_deref().map(absolutize),
        program: overrides.program.map(|p| if p.components().count() > 1 { absolutize(&p) } else { p }),
        ..overrides
    };
    merge_cli_overrides(&mut config, &overrides);

    let config = crate::config::loader::check(config)?;
    Ok(BuildContext::new(config, project_root))
}

/// Run the CLI and return the process exit code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Build { folders, out, grit, jobs, force, progress, watch } => {
            let overrides = CliOverrides { graphics: Some(folders), build: out, program: grit, jobs, progress };
            build::run_build(config, overrides, force, watch, cli.verbose)
        }
        Commands::Check { folders, out } => {
            let overrides = CliOverrides { graphics: Some(folders), build: out, ..Default::default() };
            check::run_check(config, overrides)
        }
        Commands::Clean { out } => {
            let overrides = CliOverrides { build: out, ..Default::default() };
            build::run_clean(config, overrides)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from([
            "gfxbake", "build", "graphics", "more", "--out", "build/gfx", "--grit", "tools/grit", "-j", "3", "--force",
            "--progress", "json",
        ]);
        match cli.command {
            Commands::Build { folders, out, grit, jobs, force, progress, watch } => {
                assert_eq!(folders, vec![PathBuf::from("graphics"), PathBuf::from("more")]);
                assert_eq!(out, Some(PathBuf::from("build/gfx")));
                assert_eq!(grit, Some(PathBuf::from("tools/grit")));
                assert_eq!(jobs, Some(3));
                assert!(force);
                assert_eq!(progress, Some(ProgressFormat::Json));
                assert!(!watch);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_progress() {
        assert!(Cli::try_parse_from(["gfxbake", "build", "--progress", "loud"]).is_err());
    }

    #[test]
    fn test_global_verbose() {
        let cli = Cli::parse_from(["gfxbake", "check", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn test_load_context_with_explicit_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("gfxbake.toml");
        std::fs::write(&config_path, "[project]\ngraphics = [\"gfx\"]\nbuild = \"out\"\n").unwrap();

        let overrides = CliOverrides { graphics: Some(vec![]), jobs: Some(2), ..Default::default() };
        let context = load_context(Some(&config_path), overrides).unwrap();
        assert_eq!(context.project_root(), temp.path());
        assert_eq!(context.folders(), vec![temp.path().join("gfx")]);
        assert_eq!(context.out_dir(), temp.path().join("out"));
        assert_eq!(context.jobs(), 2);
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize(Path::new("/abs")), PathBuf::from("/abs"));
        assert!(absolutize(Path::new("rel")).is_absolute());
    }
}
