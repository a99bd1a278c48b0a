//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle of an item within a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Discovered and stale, not yet dispatched
    Fresh,
    Compiling,
    Done,
    Failed,
}

/// Terminal status of a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Header written
    Success {
        header: PathBuf,
        /// Codec output size in bytes
        total_size: u64,
    },
    /// Build skipped (already up to date)
    Skipped,
    /// Build failed with error
    Failed(String),
}

impl ItemStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Success { .. } | ItemStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemStatus::Failed(_))
    }

    pub fn state(&self) -> ItemState {
        match self {
            ItemStatus::Success { .. } | ItemStatus::Skipped => ItemState::Done,
            ItemStatus::Failed(_) => ItemState::Failed,
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Success { .. } => write!(f, "success"),
            ItemStatus::Skipped => write!(f, "skipped"),
            ItemStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of building a single item.
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub name: String,
    pub status: ItemStatus,
    pub duration: Duration,
}

impl ItemResult {
    /// Create a successful result.
    pub fn success(name: String, header: PathBuf, total_size: u64, duration: Duration) -> Self {
        Self { name, status: ItemStatus::Success { header, total_size }, duration }
    }

    /// Create a skipped result.
    pub fn skipped(name: String) -> Self {
        Self { name, status: ItemStatus::Skipped, duration: Duration::ZERO }
    }

    /// Create a failed result.
    pub fn failed(name: String, error: String, duration: Duration) -> Self {
        Self { name, status: ItemStatus::Failed(error), duration }
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Graphics size, zero unless the item was compiled.
    pub fn total_size(&self) -> u64 {
        match self.status {
            ItemStatus::Success { total_size, .. } => total_size,
            _ => 0,
        }
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each item
    pub items: Vec<ItemResult>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item result.
    pub fn add_result(&mut self, result: ItemResult) {
        self.items.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Get the number of compiled items.
    pub fn success_count(&self) -> usize {
        self.successes().len()
    }

    /// Get the number of skipped items.
    pub fn skipped_count(&self) -> usize {
        self.items.iter().filter(|r| matches!(r.status, ItemStatus::Skipped)).count()
    }

    /// Get the number of failed items.
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the overall build succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Compiled items, sorted by name.
    pub fn successes(&self) -> Vec<&ItemResult> {
        let mut successes: Vec<_> =
            self.items.iter().filter(|r| matches!(r.status, ItemStatus::Success { .. })).collect();
        successes.sort_by(|a, b| a.name.cmp(&b.name));
        successes
    }

    /// Failed items, sorted by name.
    pub fn failures(&self) -> Vec<&ItemResult> {
        let mut failures: Vec<_> = self.items.iter().filter(|r| r.status.is_failure()).collect();
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        failures
    }

    /// Sum of the graphics size of every compiled item.
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(ItemResult::total_size).sum()
    }

    /// Process exit code: 0 iff no item failed.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Format a summary of the build result.
    ///
    /// Successes come first with a running size total, then one
    /// `<name> error: <message>` line per failure.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        let mut running_total = 0;

        for item in self.successes() {
            if let ItemStatus::Success { header, total_size } = &item.status {
                running_total += total_size;
                lines.push(success_line(&item.name, header, *total_size, running_total));
            }
        }

        if self.failed_count() == 0 {
            if self.success_count() > 0 {
                lines.push(format!("    Processed graphics size: {} bytes", self.total_size()));
            }
        } else {
            for item in self.failures() {
                if let ItemStatus::Failed(err) = &item.status {
                    lines.push(failure_line(&item.name, err));
                }
            }
        }

        if lines.is_empty() && self.skipped_count() > 0 {
            lines.push(format!("    {} item(s) up to date", self.skipped_count()));
        }

        lines.join("\n")
    }
}

/// Report line for a compiled item.
pub fn success_line(name: &str, header: &std::path::Path, total_size: u64, running_total: u64) -> String {
    format!(
        "    {} item header written in {} (graphics size: {} bytes, total: {} bytes)",
        name,
        header.display(),
        total_size,
        running_total
    )
}

/// Report line for a failed item.
pub fn failure_line(name: &str, error: &str) -> String {
    format!("{} error: {}", name, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(name: &str, size: u64) -> ItemResult {
        ItemResult::success(
            name.to_string(),
            PathBuf::from(format!("build/bn_sprite_items_{}.h", name)),
            size,
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_item_status_display() {
        assert_eq!(ItemStatus::Skipped.to_string(), "skipped");
        assert_eq!(ItemStatus::Failed("error".to_string()).to_string(), "failed: error");
    }

    #[test]
    fn test_item_status_state() {
        assert_eq!(success("a", 1).status.state(), ItemState::Done);
        assert_eq!(ItemStatus::Failed("x".to_string()).state(), ItemState::Failed);
    }

    #[test]
    fn test_build_result_counts() {
        let mut result = BuildResult::new();
        result.add_result(success("ship", 100));
        result.add_result(ItemResult::skipped("stage".to_string()));
        result.add_result(ItemResult::failed("boss".to_string(), "bad".to_string(), Duration::ZERO));

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.total_size(), 100);
    }

    #[test]
    fn test_summary_success() {
        let mut result = BuildResult::new();
        result.add_result(success("ship", 100));
        result.add_result(success("alien", 40));

        let summary = result.summary();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(
            lines,
            vec![
                "    alien item header written in build/bn_sprite_items_alien.h (graphics size: 40 bytes, total: 40 bytes)",
                "    ship item header written in build/bn_sprite_items_ship.h (graphics size: 100 bytes, total: 140 bytes)",
                "    Processed graphics size: 140 bytes",
            ]
        );
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_summary_lists_every_success_and_failure() {
        let mut result = BuildResult::new();
        result.add_result(success("ship", 100));
        result.add_result(ItemResult::failed("boss".to_string(), "invalid `height`: x".to_string(), Duration::ZERO));
        result.add_result(success("alien", 40));

        let summary = result.summary();
        assert!(summary.contains("alien item header written"));
        assert!(summary.contains("ship item header written"));
        assert!(summary.ends_with("boss error: invalid `height`: x"));
        assert!(!summary.contains("Processed graphics size"));
    }

    #[test]
    fn test_summary_all_skipped() {
        let mut result = BuildResult::new();
        result.add_result(ItemResult::skipped("ship".to_string()));
        assert_eq!(result.summary(), "    1 item(s) up to date");
    }

    #[test]
    fn test_empty_result() {
        let result = BuildResult::new().with_duration(Duration::from_secs(1));
        assert!(result.is_success());
        assert_eq!(result.summary(), "");
        assert_eq!(result.total_duration, Duration::from_secs(1));
    }
}
