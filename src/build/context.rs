//! Build context containing configuration and state for a build.

use crate::config::GfxbakeConfig;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// Relative folders in the configuration are resolved against the project
/// root (the directory holding `gfxbake.toml`, or the working directory).
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: GfxbakeConfig,
    project_root: PathBuf,
    verbose: bool,
    /// Ignore the ledger and rebuild every item
    force: bool,
}

impl BuildContext {
    pub fn new(config: GfxbakeConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false, force: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GfxbakeConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Asset folders, resolved to absolute paths.
    pub fn folders(&self) -> Vec<PathBuf> {
        self.config.project.graphics.iter().map(|folder| self.resolve_path(folder)).collect()
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.build)
    }

    /// Codec executable. Bare names are left for `PATH` lookup.
    pub fn codec_program(&self) -> PathBuf {
        let program = &self.config.codec.program;
        if program.components().count() > 1 {
            self.resolve_path(program)
        } else {
            program.clone()
        }
    }

    pub fn jobs(&self) -> usize {
        self.config.effective_jobs()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set force mode.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::resolve_path(&self.project_root, path)
    }
}
