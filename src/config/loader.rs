//! Configuration loading and discovery for `gfxbake.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{GfxbakeConfig, ProgressFormat};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`find_config`].
pub const CONFIG_FILE: &str = "gfxbake.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse gfxbake.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Replace the asset folder list
    pub graphics: Option<Vec<PathBuf>>,
    /// Override output directory
    pub build: Option<PathBuf>,
    /// Override codec executable
    pub program: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    pub progress: Option<ProgressFormat>,
}

/// Find gfxbake.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find gfxbake.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start directory,
/// useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a gfxbake.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the
/// default configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("game/gfxbake.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<GfxbakeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(GfxbakeConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<GfxbakeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: GfxbakeConfig = toml::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded config");

    check(config)
}

/// Run validation, turning collected errors into [`ConfigError::Validation`].
pub fn check(config: GfxbakeConfig) -> Result<GfxbakeConfig, ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values. An empty folder
/// list on the command line leaves the configured folders in place.
pub fn merge_cli_overrides(config: &mut GfxbakeConfig, overrides: &CliOverrides) {
    if let Some(ref graphics) = overrides.graphics {
        if !graphics.is_empty() {
            config.project.graphics = graphics.clone();
        }
    }

    if let Some(ref build) = overrides.build {
        config.project.build = build.clone();
    }

    if let Some(ref program) = overrides.program {
        config.codec.program = program.clone();
    }

    if let Some(jobs) = overrides.jobs {
        config.build.jobs = jobs;
    }

    if let Some(progress) = overrides.progress {
        config.build.progress = progress;
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the gfxbake.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
