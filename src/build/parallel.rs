//! Parallel item compilation.
//!
//! Stale items are compiled on a fixed-size rayon pool, one task per item.
//! Tasks share nothing but the codec backend: each writes its own header,
//! its own `<name>_bn_gfx` codec stem and its own ledger marker. The only
//! thing a task sends back is a [`TaskMessage`] over a channel, which the
//! calling thread turns into progress events.
//!
//! # How It Works
//!
//! 1. A scoped dispatcher thread spawns every item onto the pool
//! 2. The calling thread receives messages while the pool runs
//! 3. Successes are reported as soon as they arrive
//! 4. Failures are held back and reported, sorted by name, after the batch
//!
//! # Example
//!
//! ```ignore
//! use gfxbake::build::{Ledger, ParallelBuild, ProgressTracker};
//!
//! let build = ParallelBuild::new(out_dir, &backend, &reporter).with_jobs(4);
//! let results = build.run(&items, &mut tracker)?;
//! ```

use crate::build::progress::{ProgressEvent, ProgressReporter, ProgressTracker};
use crate::build::{BuildError, ItemResult, Ledger};
use crate::codec::CodecBackend;
use crate::compile::{compile_item, ItemSource};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Message sent from a worker task to the orchestrator.
#[derive(Debug)]
pub enum TaskMessage {
    Started(String),
    Finished(ItemResult),
}

/// Parallel build executor.
pub struct ParallelBuild<'a> {
    out_dir: PathBuf,
    ledger: Ledger,
    jobs: usize,
    backend: &'a dyn CodecBackend,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ParallelBuild<'a> {
    /// Create a parallel build writing headers and markers to `out_dir`.
    pub fn new(out_dir: PathBuf, backend: &'a dyn CodecBackend, reporter: &'a dyn ProgressReporter) -> Self {
        let ledger = Ledger::new(out_dir.clone());
        Self { out_dir, ledger, jobs: default_jobs(), backend, reporter }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Compile every item, returning one result per item.
    ///
    /// Item failures never abort the batch; only a pool that cannot be
    /// created is an error.
    pub fn run(&self, items: &[ItemSource], tracker: &mut ProgressTracker) -> Result<Vec<ItemResult>, BuildError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.min(items.len()))
            .thread_name(|index| format!("gfxbake-worker-{}", index))
            .build()?;

        tracing::info!(items = items.len(), jobs = self.jobs, "dispatching items");

        let (tx, rx) = mpsc::channel::<TaskMessage>();
        let mut results = Vec::with_capacity(items.len());
        let mut deferred = Vec::new();

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.scope(|s| {
                    for source in items {
                        let tx = tx.clone();
                        s.spawn(move |_| {
                            let _ = tx.send(TaskMessage::Started(source.name.clone()));
                            let result = self.compile_guarded(source);
                            let _ = tx.send(TaskMessage::Finished(result));
                        });
                    }
                });
            });

            for message in rx {
                match message {
                    TaskMessage::Started(name) => {
                        tracker.item_started(&name);
                        self.reporter.report(ProgressEvent::ItemStarted { name });
                    }
                    TaskMessage::Finished(result) if result.status.is_failure() => deferred.push(result),
                    TaskMessage::Finished(result) => {
                        self.report_completed(&result, tracker);
                        results.push(result);
                    }
                }
            }
        });

        deferred.sort_by(|a, b| a.name.cmp(&b.name));
        for result in deferred {
            self.report_completed(&result, tracker);
            results.push(result);
        }

        Ok(results)
    }

    fn report_completed(&self, result: &ItemResult, tracker: &mut ProgressTracker) {
        let running_total = tracker.item_completed(&result.name, &result.status);
        self.reporter.report(ProgressEvent::ItemCompleted {
            name: result.name.clone(),
            status: result.status.clone(),
            duration_ms: result.duration.as_millis() as u64,
            running_total,
        });
    }

    /// Compile one item, turning a panic into an ordinary failure.
    fn compile_guarded(&self, source: &ItemSource) -> ItemResult {
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(|| self.compile_one(source, start))) {
            Ok(result) => result,
            Err(_) => ItemResult::failed(source.name.clone(), "internal error: task panicked".to_string(), start.elapsed()),
        }
    }

    fn compile_one(&self, source: &ItemSource, start: Instant) -> ItemResult {
        let compiled = match compile_item(source, &self.out_dir, self.backend) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::debug!(item = %source.name, error = %e, "item failed");
                return ItemResult::failed(source.name.clone(), e.to_string(), start.elapsed());
            }
        };

        // The marker is the commit point: without it the item stays stale.
        if let Err(e) = self.ledger.record(&compiled.name) {
            return ItemResult::failed(compiled.name, e.to_string(), start.elapsed());
        }

        ItemResult::success(compiled.name, compiled.header, compiled.total_size, start.elapsed())
    }
}
