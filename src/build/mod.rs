//! Build orchestration for gfxbake
//!
//! Turns a set of asset folders into an up-to-date set of generated item
//! headers.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Find assets and their descriptors in the configured folders
//! - **Planning**: Split items into stale and up-to-date using the ledger
//! - **Execution**: Compile stale items in parallel, isolating failures
//!
//! # Example
//!
//! ```ignore
//! use gfxbake::build::{BuildContext, BuildPipeline, ConsoleProgress};
//! use gfxbake::codec::GritBackend;
//! use gfxbake::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let backend = GritBackend::new(context.codec_program());
//! let reporter = ConsoleProgress::new();
//!
//! let result = BuildPipeline::new(context, &backend, &reporter).build()?;
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod ledger;
pub mod parallel;
pub mod pipeline;
pub mod progress;
pub mod result;

pub use context::*;
pub use discovery::*;
pub use ledger::*;
pub use parallel::*;
pub use pipeline::*;
pub use progress::{
    reporter_for, ConsoleProgress, JsonProgress, NullProgress, ProgressEvent, ProgressReporter, ProgressTracker,
};
pub use result::*;
