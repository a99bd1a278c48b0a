//! Configuration module for gfxbake
//!
//! Provides types and parsing for `gfxbake.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
