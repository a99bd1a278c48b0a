//! Build progress reporting.
//!
//! Reporters receive [`ProgressEvent`]s from the orchestrator on the main
//! thread. Successes arrive as items complete; failures arrive after the
//! whole batch has finished.
//!
//! # Example
//!
//! ```ignore
//! use gfxbake::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { total_items: 2, skipped: 5 });
//! reporter.report(ProgressEvent::ItemStarted { name: "ship".to_string() });
//! ```

use crate::build::result::{failure_line, success_line, ItemState, ItemStatus};
use crate::config::ProgressFormat;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Events that can be reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build process started
    BuildStarted {
        /// Number of stale items about to be compiled
        total_items: usize,
        /// Number of items already up to date
        skipped: usize,
    },
    /// An item was dispatched to a worker
    ItemStarted { name: String },
    /// An item reached a terminal status
    ItemCompleted {
        name: String,
        status: ItemStatus,
        duration_ms: u64,
        /// Graphics size of every success reported so far, this one included
        running_total: u64,
    },
    /// Build process completed
    BuildCompleted {
        /// Whether the overall build succeeded
        success: bool,
        duration_ms: u64,
        succeeded: usize,
        skipped: usize,
        failed: usize,
        /// Graphics size of all compiled items
        total_size: u64,
    },
    /// A warning was generated
    Warning {
        /// Item that generated the warning (if applicable)
        name: Option<String>,
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// Build the reporter selected by configuration.
pub fn reporter_for(format: ProgressFormat, verbose: bool) -> Box<dyn ProgressReporter> {
    match format {
        ProgressFormat::Console => Box::new(ConsoleProgress::new().with_verbose(verbose)),
        ProgressFormat::Json => Box::new(JsonProgress::new()),
        ProgressFormat::None => Box::new(NullProgress::new()),
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter on stderr, colored when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, verbose: false, output: Mutex::new(Box::new(output)) }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { total_items, skipped } => {
                if total_items > 0 {
                    self.writeln(&format!(
                        "{} Building {} item{}...",
                        self.cyan("[build]"),
                        total_items,
                        if total_items == 1 { "" } else { "s" }
                    ));
                } else if skipped > 0 {
                    self.writeln(&format!("{} All {} items up to date", self.cyan("[build]"), skipped));
                }
            }
            ProgressEvent::ItemStarted { name } => {
                if self.verbose {
                    self.writeln(&format!("{} {}", self.cyan("[build]"), name));
                }
            }
            ProgressEvent::ItemCompleted { name, status, duration_ms, running_total } => match status {
                ItemStatus::Success { header, total_size } => {
                    let mut line = success_line(&name, &header, total_size, running_total);
                    if self.verbose {
                        line.push_str(&format!(" in {}", format_duration(duration_ms)));
                    }
                    self.writeln(&line);
                }
                ItemStatus::Skipped => {
                    if self.verbose {
                        self.writeln(&format!("    {} {}", name, self.yellow("up to date")));
                    }
                }
                ItemStatus::Failed(err) => {
                    self.writeln(&self.red(&failure_line(&name, &err)));
                }
            },
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed, total_size } => {
                if success {
                    if succeeded > 0 {
                        self.writeln(&format!("    Processed graphics size: {} bytes", total_size));
                        self.writeln(&format!(
                            "{} {} built, {} skipped in {}",
                            self.green("[done]"),
                            succeeded,
                            skipped,
                            format_duration(duration_ms)
                        ));
                    }
                } else {
                    self.writeln(&format!(
                        "{} Build failed: {} succeeded, {} skipped, {} {} in {}",
                        self.red("[error]"),
                        succeeded,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        format_duration(duration_ms)
                    ));
                }
            }
            ProgressEvent::Warning { name, message } => {
                let prefix = match name {
                    Some(name) => format!("{}: ", name),
                    None => String::new(),
                };
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON progress reporter for machine-readable output, one object per line.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stdout.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stdout())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::BuildStarted { total_items, skipped } => {
                json!({ "event": "build_started", "total_items": total_items, "skipped": skipped })
            }
            ProgressEvent::ItemStarted { name } => json!({ "event": "item_started", "name": name }),
            ProgressEvent::ItemCompleted { name, status, duration_ms, running_total } => {
                let mut value = json!({
                    "event": "item_completed",
                    "name": name,
                    "duration_ms": duration_ms,
                });
                match status {
                    ItemStatus::Success { header, total_size } => {
                        value["status"] = json!("success");
                        value["header"] = json!(header.display().to_string());
                        value["total_size"] = json!(total_size);
                        value["running_total"] = json!(running_total);
                    }
                    ItemStatus::Skipped => value["status"] = json!("skipped"),
                    ItemStatus::Failed(err) => {
                        value["status"] = json!("failed");
                        value["error"] = json!(err);
                    }
                }
                value
            }
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed, total_size } => json!({
                "event": "build_completed",
                "success": success,
                "duration_ms": duration_ms,
                "succeeded": succeeded,
                "skipped": skipped,
                "failed": failed,
                "total_size": total_size,
            }),
            ProgressEvent::Warning { name, message } => {
                json!({ "event": "warning", "name": name, "message": message })
            }
        };
        self.write_json(value);
    }
}

/// Aggregates build statistics and per-item states on the orchestrator thread.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    start_time: Option<Instant>,
    states: BTreeMap<String, ItemState>,
    skipped: usize,
    running_total: u64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a batch of stale items.
    pub fn start<'a>(&mut self, items: impl IntoIterator<Item = &'a str>, skipped: usize) {
        self.start_time = Some(Instant::now());
        self.states = items.into_iter().map(|name| (name.to_string(), ItemState::Fresh)).collect();
        self.skipped = skipped;
        self.running_total = 0;
    }

    pub fn item_started(&mut self, name: &str) {
        self.states.insert(name.to_string(), ItemState::Compiling);
    }

    /// Mark an item as finished; returns the running success total.
    pub fn item_completed(&mut self, name: &str, status: &ItemStatus) -> u64 {
        self.states.insert(name.to_string(), status.state());
        if let ItemStatus::Success { total_size, .. } = status {
            self.running_total += total_size;
        }
        self.running_total
    }

    pub fn state(&self, name: &str) -> Option<ItemState> {
        self.states.get(name).copied()
    }

    fn count(&self, state: ItemState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemState::Done)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemState::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Check if every tracked item reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.states.values().all(|s| matches!(s, ItemState::Done | ItemState::Failed))
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// Generate a BuildCompleted event from current state.
    pub fn build_completed_event(&self) -> ProgressEvent {
        ProgressEvent::BuildCompleted {
            success: self.failed() == 0,
            duration_ms: self.elapsed().as_millis() as u64,
            succeeded: self.succeeded(),
            skipped: self.skipped,
            failed: self.failed(),
            total_size: self.running_total,
        }
    }
}

/// Format a duration in milliseconds to a human-readable string.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    // Helper for testing output
    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn console() -> (ConsoleProgress, Arc<Mutex<Vec<u8>>>) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = ConsoleProgress::with_output(TestWriter(Arc::clone(&output))).with_colors(false);
        (reporter, output)
    }

    fn text(output: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&output.lock().unwrap()).into_owned()
    }

    fn success_event() -> ProgressEvent {
        ProgressEvent::ItemCompleted {
            name: "ship".to_string(),
            status: ItemStatus::Success { header: PathBuf::from("build/bn_sprite_items_ship.h"), total_size: 544 },
            duration_ms: 12,
            running_total: 544,
        }
    }

    #[test]
    fn test_null_progress() {
        let reporter = NullProgress::new();
        reporter.report(ProgressEvent::BuildStarted { total_items: 10, skipped: 0 });
        assert!(!reporter.is_verbose());
    }

    #[test]
    fn test_console_build_started() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::BuildStarted { total_items: 5, skipped: 1 });
        assert!(text(&output).contains("Building 5 items"));
    }

    #[test]
    fn test_console_all_up_to_date() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::BuildStarted { total_items: 0, skipped: 3 });
        assert!(text(&output).contains("All 3 items up to date"));
    }

    #[test]
    fn test_console_item_success_line() {
        let (reporter, output) = console();
        reporter.report(success_event());
        assert_eq!(
            text(&output).trim_end(),
            "    ship item header written in build/bn_sprite_items_ship.h (graphics size: 544 bytes, total: 544 bytes)"
        );
    }

    #[test]
    fn test_console_item_failed() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::ItemCompleted {
            name: "boss".to_string(),
            status: ItemStatus::Failed("invalid `height`: height field not found in graphics json file".to_string()),
            duration_ms: 3,
            running_total: 0,
        });
        assert!(text(&output).starts_with("boss error: invalid `height`"));
    }

    #[test]
    fn test_console_build_completed_success() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::BuildCompleted {
            success: true,
            duration_ms: 1500,
            succeeded: 5,
            skipped: 2,
            failed: 0,
            total_size: 4096,
        });
        let text = text(&output);
        assert!(text.contains("    Processed graphics size: 4096 bytes"));
        assert!(text.contains("5 built, 2 skipped in 1.5s"));
    }

    #[test]
    fn test_console_build_completed_failed() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::BuildCompleted {
            success: false,
            duration_ms: 500,
            succeeded: 3,
            skipped: 1,
            failed: 2,
            total_size: 10,
        });
        let text = text(&output);
        assert!(text.contains("[error]"));
        assert!(text.contains("2 failures"));
        assert!(!text.contains("Processed graphics size"));
    }

    #[test]
    fn test_console_warning() {
        let (reporter, output) = console();
        reporter.report(ProgressEvent::Warning { name: Some("ship".to_string()), message: "odd".to_string() });
        assert_eq!(text(&output).trim_end(), "[warn] ship: odd");
    }

    #[test]
    fn test_json_item_completed() {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = JsonProgress::with_output(TestWriter(Arc::clone(&output)));
        reporter.report(success_event());

        let value: serde_json::Value = serde_json::from_str(text(&output).trim()).unwrap();
        assert_eq!(value["event"], "item_completed");
        assert_eq!(value["status"], "success");
        assert_eq!(value["total_size"], 544);
        assert_eq!(value["header"], "build/bn_sprite_items_ship.h");
    }

    #[test]
    fn test_json_item_failed_escapes_message() {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = JsonProgress::with_output(TestWriter(Arc::clone(&output)));
        reporter.report(ProgressEvent::ItemCompleted {
            name: "boss".to_string(),
            status: ItemStatus::Failed("grit said \"no\"\nbye".to_string()),
            duration_ms: 1,
            running_total: 0,
        });

        let value: serde_json::Value = serde_json::from_str(text(&output).trim()).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "grit said \"no\"\nbye");
    }

    #[test]
    fn test_tracker_lifecycle() {
        let mut tracker = ProgressTracker::new();
        tracker.start(["a", "b", "c"], 2);
        assert_eq!(tracker.state("a"), Some(ItemState::Fresh));
        assert!(!tracker.is_complete());

        tracker.item_started("a");
        assert_eq!(tracker.state("a"), Some(ItemState::Compiling));

        let a = ItemStatus::Success { header: PathBuf::from("a.h"), total_size: 10 };
        let b = ItemStatus::Success { header: PathBuf::from("b.h"), total_size: 5 };
        assert_eq!(tracker.item_completed("a", &a), 10);
        assert_eq!(tracker.item_completed("b", &b), 15);
        assert_eq!(tracker.item_completed("c", &ItemStatus::Failed("x".to_string())), 15);

        assert!(tracker.is_complete());
        assert_eq!(tracker.state("c"), Some(ItemState::Failed));
        match tracker.build_completed_event() {
            ProgressEvent::BuildCompleted { success, succeeded, skipped, failed, total_size, .. } => {
                assert!(!success);
                assert_eq!((succeeded, skipped, failed, total_size), (2, 2, 1, 15));
            }
            other => panic!("Expected BuildCompleted event, got {:?}", other),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500), "500ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(90000), "1m 30s");
    }
}
