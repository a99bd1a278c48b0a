//! Configuration schema types for `gfxbake.toml`
//!
//! Every section is optional; an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How build progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressFormat {
    /// Human-readable lines on stderr
    #[default]
    Console,
    /// One JSON object per event on stdout
    Json,
    /// No progress output
    None,
}

impl FromStr for ProgressFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(ProgressFormat::Console),
            "json" => Ok(ProgressFormat::Json),
            "none" => Ok(ProgressFormat::None),
            other => Err(format!("unknown progress format '{}' (expected console, json or none)", other)),
        }
    }
}

impl std::fmt::Display for ProgressFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProgressFormat::Console => "console",
            ProgressFormat::Json => "json",
            ProgressFormat::None => "none",
        };
        f.write_str(name)
    }
}

/// Project layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Asset folders, scanned non-recursively
    #[serde(default = "default_graphics")]
    pub graphics: Vec<PathBuf>,
    /// Output directory for headers, codec data and ledger markers
    #[serde(default = "default_build")]
    pub build: PathBuf,
}

fn default_graphics() -> Vec<PathBuf> {
    vec![PathBuf::from("graphics")]
}

fn default_build() -> PathBuf {
    PathBuf::from("build")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { graphics: default_graphics(), build: default_build() }
    }
}

/// Codec backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Executable name or path of the codec
    #[serde(default = "default_program")]
    pub program: PathBuf,
}

fn default_program() -> PathBuf {
    PathBuf::from(crate::codec::DEFAULT_PROGRAM)
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { program: default_program() }
    }
}

/// Build orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildConfig {
    /// Worker count; 0 means available parallelism
    #[serde(default)]
    pub jobs: usize,
    #[serde(default)]
    pub progress: ProgressFormat,
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), clear_screen: false }
    }
}

/// Complete gfxbake.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GfxbakeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "project.graphics")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gfxbake.toml: '{}' {}", self.field, self.message)
    }
}

impl GfxbakeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.graphics.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.graphics".to_string(),
                message: "must contain at least one folder".to_string(),
            });
        }

        for (index, folder) in self.project.graphics.iter().enumerate() {
            if folder.as_os_str().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("project.graphics[{}]", index),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        if self.project.build.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.build".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.codec.program.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "codec.program".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Effective worker count.
    pub fn effective_jobs(&self) -> usize {
        match self.build.jobs {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            jobs => jobs,
        }
    }
}
