//! Item-scoped compilation errors.
//!
//! Every error that can happen while compiling a single item converts into
//! [`CompileError`]. The build orchestrator records these per item; they
//! never abort sibling items.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::asset::DecodeError;
use crate::codec::CodecError;
use crate::item::SpecValidationError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The descriptor is invalid for its asset.
    #[error(transparent)]
    Spec(#[from] SpecValidationError),

    /// The asset could not be decoded (or quantized).
    #[error("{}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// The codec failed or produced an unusable report.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Reading a descriptor or writing a header failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileError::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_is_transparent() {
        let err: CompileError = SpecValidationError::new("height", "too big").into();
        assert_eq!(err.to_string(), "invalid `height`: too big");
    }

    #[test]
    fn test_decode_error_names_path() {
        let err = CompileError::Decode { path: PathBuf::from("a/b.bmp"), source: DecodeError::Truncated };
        assert_eq!(err.to_string(), "a/b.bmp: file is truncated");
    }

    #[test]
    fn test_io_helper() {
        let err = CompileError::io("x.json", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.to_string().starts_with("x.json: "));
    }
}
