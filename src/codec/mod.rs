//! Codec backend adapter.
//!
//! The tile, palette and map packing itself is delegated to an external
//! codec (`grit`). This module owns the command line grammar
//! ([`CodecRequest`]), the report grammar ([`CodecReport`]) and the
//! [`CodecBackend`] seam, so the pipeline can run against a scripted
//! backend in tests.

mod grit;
mod report;
mod request;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use grit::{GritBackend, DEFAULT_PROGRAM};
pub use report::CodecReport;
pub use request::{CodecRequest, ColorRequest, GraphicsRequest, MapRequest};

/// Failure of a single codec invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The codec process could not be started.
    #[error("failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The codec exited with a non-zero status.
    #[error("grit call failed (return code {}): {output}", status_text(.status))]
    Failed { status: Option<i32>, output: String },

    /// The report header was not written or could not be read.
    #[error("grit report {} unreadable: {source} (output: {output})", .path.display())]
    MissingReport {
        path: PathBuf,
        #[source]
        source: io::Error,
        output: String,
    },

    /// The report header lacks a required figure.
    #[error("invalid grit report: {reason} (output: {output})")]
    MalformedReport { reason: String, output: String },
}

fn status_text(status: &Option<i32>) -> String {
    status.map_or_else(|| "none".to_string(), |code| code.to_string())
}

/// Something that can turn a [`CodecRequest`] into a [`CodecReport`].
///
/// Implementations are shared across worker threads.
pub trait CodecBackend: Send + Sync {
    /// Run one blocking invocation. Data files are left in place; the
    /// report header is consumed.
    fn invoke(&self, request: &CodecRequest) -> Result<CodecReport, CodecError>;
}

impl<T: CodecBackend + ?Sized> CodecBackend for &T {
    fn invoke(&self, request: &CodecRequest) -> Result<CodecReport, CodecError> {
        (**self).invoke(request)
    }
}

impl<T: CodecBackend + ?Sized> CodecBackend for std::sync::Arc<T> {
    fn invoke(&self, request: &CodecRequest) -> Result<CodecReport, CodecError> {
        (**self).invoke(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = CodecError::Failed { status: Some(2), output: "bad flag".to_string() };
        assert_eq!(err.to_string(), "grit call failed (return code 2): bad flag");

        let err = CodecError::Failed { status: None, output: String::new() };
        assert!(err.to_string().contains("return code none"));
    }
}
