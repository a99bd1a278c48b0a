//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for `gfxbake build --watch`.
//! Every rebuild goes through the regular pipeline, so only items whose
//! asset or descriptor changed (or that failed last time) are recompiled.

use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

use crate::asset::AssetFormat;
use crate::build::{BuildError, BuildPipeline, BuildResult, ProgressEvent};
use crate::config::schema::WatchConfig;

/// Error during watch mode
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    #[error("Failed to watch {}: {source}", .path.display())]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watch channel error: {0}")]
    Channel(String),

    #[error("Graphics folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),
}

/// Tracks failed items across rebuilds to announce recoveries.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    failed: BTreeSet<String>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with a new build result; returns items that are no longer failing.
    ///
    /// Items skipped as up to date count as fixed, since a failed item is
    /// never up to date.
    pub fn update(&mut self, result: &BuildResult) -> Vec<String> {
        let current: BTreeSet<String> = result.failures().into_iter().map(|item| item.name.clone()).collect();
        let fixed = self
            .failed
            .difference(&current)
            .filter(|name| result.items.iter().any(|item| &item.name == *name))
            .cloned()
            .collect();
        self.failed = current;
        fixed
    }

    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.failed.len()
    }
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

/// Check if a changed file can affect the build.
pub fn is_relevant_file(path: &Path) -> bool {
    let hidden = path.file_name().and_then(|n| n.to_str()).map_or(true, |n| n.starts_with('.'));
    if hidden {
        return false;
    }
    AssetFormat::from_path(path).is_some() || path.extension().map_or(false, |ext| ext == "json")
}

/// Watch the pipeline's asset folders and rebuild on every relevant change.
///
/// Runs one build immediately, then blocks until the watcher channel closes.
/// Each build outcome, including global build errors, is handed to
/// `on_build`; none of them stop the watch loop.
pub fn watch_and_rebuild<F>(pipeline: &BuildPipeline<'_>, config: &WatchConfig, mut on_build: F) -> Result<(), WatchError>
where
    F: FnMut(Result<BuildResult, BuildError>, &[String]),
{
    let folders = pipeline.context().folders();
    if let Some(missing) = folders.iter().find(|folder| !folder.is_dir()) {
        return Err(WatchError::FolderNotFound(missing.clone()));
    }

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(u64::from(config.debounce_ms));
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;

    for folder in &folders {
        debouncer
            .watcher()
            .watch(folder, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::WatchPath { path: folder.clone(), source })?;
    }

    let mut tracker = ErrorTracker::new();
    let mut rebuild = |tracker: &mut ErrorTracker| {
        if config.clear_screen {
            clear_screen();
        }
        let result = pipeline.build();
        let fixed = match &result {
            Ok(result) => tracker.update(result),
            Err(_) => Vec::new(),
        };
        on_build(result, &fixed);
    };

    rebuild(&mut tracker);
    tracing::info!(folders = folders.len(), "watching for changes");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any) && is_relevant_file(&e.path))
                    .collect();

                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!(path = %event.path.display(), "changed");
                }
                rebuild(&mut tracker);
            }
            Ok(Err(error)) => {
                tracing::warn!(error = ?error, "watch error, continuing");
                pipeline
                    .reporter()
                    .report(ProgressEvent::Warning { name: None, message: format!("watch error: {:?}", error) });
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildContext, ItemResult, NullProgress};
    use crate::codec::GritBackend;
    use crate::config::GfxbakeConfig;
    use tempfile::TempDir;

    fn result(failed: &[&str], ok: &[&str]) -> BuildResult {
        let mut result = BuildResult::new();
        for name in failed {
            result.add_result(ItemResult::failed(name.to_string(), "bad".to_string(), Duration::ZERO));
        }
        for name in ok {
            result.add_result(ItemResult::skipped(name.to_string()));
        }
        result
    }

    #[test]
    fn test_is_relevant_file() {
        assert!(is_relevant_file(Path::new("graphics/ship.bmp")));
        assert!(is_relevant_file(Path::new("graphics/ship.png")));
        assert!(is_relevant_file(Path::new("graphics/ship.json")));
        assert!(!is_relevant_file(Path::new("graphics/.ship.json")));
        assert!(!is_relevant_file(Path::new("build/bn_sprite_items_ship.h")));
        assert!(!is_relevant_file(Path::new("build/_bn_ship_file_info.txt")));
        assert!(!is_relevant_file(Path::new("noextension")));
    }

    #[test]
    fn test_error_tracker_reports_fixed_items() {
        let mut tracker = ErrorTracker::new();
        assert!(tracker.update(&result(&["ship", "boss"], &[])).is_empty());
        assert_eq!(tracker.error_count(), 2);

        let fixed = tracker.update(&result(&["boss"], &["ship"]));
        assert_eq!(fixed, vec!["ship".to_string()]);
        assert!(tracker.has_errors());
    }

    #[test]
    fn test_error_tracker_ignores_removed_items() {
        let mut tracker = ErrorTracker::new();
        tracker.update(&result(&["ship"], &[]));
        assert!(tracker.update(&result(&[], &[])).is_empty());
        assert!(!tracker.has_errors());
    }

    #[test]
    fn test_watch_missing_folder() {
        let temp = TempDir::new().unwrap();
        let context = BuildContext::new(GfxbakeConfig::default(), temp.path().to_path_buf());
        let backend = GritBackend::default();
        let reporter = NullProgress::new();
        let pipeline = BuildPipeline::new(context, &backend, &reporter);

        let err = watch_and_rebuild(&pipeline, &WatchConfig::default(), |_, _| {}).unwrap_err();
        assert!(matches!(err, WatchError::FolderNotFound(_)));
    }
}
