//! Staleness ledger.
//!
//! Each successfully compiled item leaves an empty marker file
//! `_bn_<name>_file_info.txt` in the build directory. Its modification time
//! is the item's last successful build; an item is stale when the marker is
//! missing or older than its asset or descriptor.

use crate::compile::ItemSource;
use glob::{glob, Pattern};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),
}

impl LedgerError {
    fn io(path: &Path, source: io::Error) -> Self {
        LedgerError::Io { path: path.to_path_buf(), source }
    }
}

/// `true` when a marker written at `last_build` covers both input files.
pub fn is_up_to_date(last_build: SystemTime, asset: SystemTime, descriptor: SystemTime) -> bool {
    last_build >= asset && last_build >= descriptor
}

/// Marker files of one build directory.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn marker_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("_bn_{}_file_info.txt", name))
    }

    /// Time of the last successful build, or `None` if never built.
    pub fn last_build(&self, name: &str) -> Result<Option<SystemTime>, LedgerError> {
        let path = self.marker_path(name);
        match fs::metadata(&path) {
            Ok(meta) => meta.modified().map(Some).map_err(|e| LedgerError::io(&path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::io(&path, e)),
        }
    }

    /// Whether `source` must be rebuilt.
    pub fn is_stale(&self, source: &ItemSource) -> Result<bool, LedgerError> {
        let Some(last_build) = self.last_build(&source.name)? else {
            return Ok(true);
        };

        let asset = modified(&source.asset)?;
        let descriptor = modified(&source.descriptor)?;
        Ok(!is_up_to_date(last_build, asset, descriptor))
    }

    /// Record a successful build of `name` at the current time.
    pub fn record(&self, name: &str) -> Result<PathBuf, LedgerError> {
        fs::create_dir_all(&self.dir).map_err(|e| LedgerError::io(&self.dir, e))?;

        let path = self.marker_path(name);
        let file = File::create(&path).map_err(|e| LedgerError::io(&path, e))?;
        file.set_modified(SystemTime::now()).map_err(|e| LedgerError::io(&path, e))?;
        Ok(path)
    }

    /// Remove every marker, returning how many were deleted.
    pub fn clear(&self) -> Result<usize, LedgerError> {
        if !self.dir.is_dir() {
            return Ok(0);
        }

        let pattern = format!("{}/_bn_*_file_info.txt", Pattern::escape(&self.dir.to_string_lossy()));
        let paths = glob(&pattern).map_err(|e| LedgerError::InvalidPattern(pattern.clone(), e))?;

        let mut removed = 0;
        for path in paths.flatten() {
            fs::remove_file(&path).map_err(|e| LedgerError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn modified(path: &Path) -> Result<SystemTime, LedgerError> {
    fs::metadata(path).and_then(|meta| meta.modified()).map_err(|e| LedgerError::io(path, e))
}
