//! Build pipeline orchestration.
//!
//! The pipeline discovers items, partitions them into stale and up-to-date
//! using the ledger, compiles the stale ones in parallel and collects the
//! results. Discovery and ledger errors are global and abort the build
//! before anything is dispatched.

use crate::build::progress::{ProgressEvent, ProgressReporter, ProgressTracker};
use crate::build::{
    discover_items, BuildContext, BuildResult, DiscoveryError, ItemResult, Ledger, LedgerError, ParallelBuild,
};
use crate::codec::CodecBackend;
use crate::compile::ItemSource;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Error that aborts a whole build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to create build folder {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Discovered items split by staleness.
#[derive(Debug, Default)]
pub struct BuildPlan {
    /// Items to compile, in discovery order
    pub stale: Vec<ItemSource>,
    pub up_to_date: Vec<ItemSource>,
}

impl BuildPlan {
    /// Total number of discovered items.
    pub fn len(&self) -> usize {
        self.stale.len() + self.up_to_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build pipeline for executing builds.
pub struct BuildPipeline<'a> {
    context: BuildContext,
    backend: &'a dyn CodecBackend,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(context: BuildContext, backend: &'a dyn CodecBackend, reporter: &'a dyn ProgressReporter) -> Self {
        Self { context, backend, reporter }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.context.out_dir())
    }

    /// Discover items and decide which need compiling.
    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        let items = discover_items(&self.context.folders())?;
        let ledger = self.ledger();

        let mut plan = BuildPlan::default();
        for item in items {
            if self.context.is_forced() || ledger.is_stale(&item)? {
                plan.stale.push(item);
            } else {
                plan.up_to_date.push(item);
            }
        }

        tracing::debug!(stale = plan.stale.len(), up_to_date = plan.up_to_date.len(), "build plan");
        Ok(plan)
    }

    /// Run the build pipeline.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let plan = self.plan()?;
        let mut result = self.execute_plan(&plan)?;
        result.total_duration = start.elapsed();
        Ok(result)
    }

    /// Compile the stale items of a plan.
    pub fn execute_plan(&self, plan: &BuildPlan) -> Result<BuildResult, BuildError> {
        let out_dir = self.context.out_dir();
        fs::create_dir_all(&out_dir).map_err(|source| BuildError::Io { path: out_dir.clone(), source })?;

        let mut tracker = ProgressTracker::new();
        tracker.start(plan.stale.iter().map(|item| item.name.as_str()), plan.up_to_date.len());
        self.reporter.report(ProgressEvent::BuildStarted {
            total_items: plan.stale.len(),
            skipped: plan.up_to_date.len(),
        });

        let mut result = BuildResult::new();
        for item in &plan.up_to_date {
            result.add_result(ItemResult::skipped(item.name.clone()));
        }

        let parallel = ParallelBuild::new(out_dir, self.backend, self.reporter).with_jobs(self.context.jobs());
        for item_result in parallel.run(&plan.stale, &mut tracker)? {
            result.add_result(item_result);
        }

        self.reporter.report(tracker.build_completed_event());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::NullProgress;
    use crate::codec::{CodecError, CodecReport, CodecRequest};
    use crate::config::GfxbakeConfig;
    use tempfile::TempDir;

    struct Unused;

    impl CodecBackend for Unused {
        fn invoke(&self, _: &CodecRequest) -> Result<CodecReport, CodecError> {
            Err(CodecError::MalformedReport { reason: "unused".to_string(), output: String::new() })
        }
    }

    fn context(root: &std::path::Path) -> BuildContext {
        BuildContext::new(GfxbakeConfig::default(), root.to_path_buf())
    }

    #[test]
    fn test_missing_folder_aborts() {
        let temp = TempDir::new().unwrap();
        let reporter = NullProgress::new();
        let pipeline = BuildPipeline::new(context(temp.path()), &Unused, &reporter);

        let err = pipeline.build().unwrap_err();
        assert!(matches!(err, BuildError::Discovery(DiscoveryError::FolderNotFound(_))));
    }

    #[test]
    fn test_plan_respects_ledger_and_force() {
        let temp = TempDir::new().unwrap();
        let graphics = temp.path().join("graphics");
        fs::create_dir_all(&graphics).unwrap();
        fs::write(graphics.join("ship.bmp"), b"").unwrap();
        fs::write(graphics.join("ship.json"), b"{}").unwrap();

        let reporter = NullProgress::new();
        let pipeline = BuildPipeline::new(context(temp.path()), &Unused, &reporter);
        assert_eq!(pipeline.plan().unwrap().stale.len(), 1);

        pipeline.ledger().record("ship").unwrap();
        let plan = pipeline.plan().unwrap();
        assert!(plan.stale.is_empty());
        assert_eq!(plan.up_to_date.len(), 1);
        assert_eq!(plan.len(), 1);

        let forced = BuildPipeline::new(context(temp.path()).with_force(true), &Unused, &reporter);
        assert_eq!(forced.plan().unwrap().stale.len(), 1);
    }

    #[test]
    fn test_up_to_date_items_are_skipped() {
        let temp = TempDir::new().unwrap();
        let graphics = temp.path().join("graphics");
        fs::create_dir_all(&graphics).unwrap();
        fs::write(graphics.join("ship.bmp"), b"").unwrap();
        fs::write(graphics.join("ship.json"), b"{}").unwrap();

        let reporter = NullProgress::new();
        let pipeline = BuildPipeline::new(context(temp.path()), &Unused, &reporter);
        pipeline.ledger().record("ship").unwrap();

        let result = pipeline.build().unwrap();
        assert_eq!(result.skipped_count(), 1);
        assert!(result.is_success());
    }
}
