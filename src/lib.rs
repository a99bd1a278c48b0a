//! gfxbake - Graphics asset compiler for GBA-class tile engines
//!
//! This library provides functionality to:
//! - Decode BMP and PNG assets and validate their JSON descriptors
//! - Pick the smallest tile, palette and map encodings through the `grit` codec
//! - Emit C++ item headers for the `bn::` runtime
//! - Build whole asset folders incrementally and in parallel

pub mod asset;
pub mod build;
pub mod cli;
pub mod codec;
pub mod compile;
pub mod config;
pub mod declaration;
pub mod error;
pub mod item;
pub mod optimizer;
pub mod watch;

pub use compile::{compile_item, CompiledItem, ItemSource};
pub use error::CompileError;
pub use item::{ItemKind, ItemSpec, ItemType};
