//! Process backend running the `grit` executable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{CodecBackend, CodecError, CodecReport, CodecRequest};

/// Default executable name, looked up on `PATH`.
pub const DEFAULT_PROGRAM: &str = "grit";

/// Runs `grit` once per request and reads back its report header.
#[derive(Debug, Clone)]
pub struct GritBackend {
    program: PathBuf,
}

impl GritBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for GritBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CodecBackend for GritBackend {
    fn invoke(&self, request: &CodecRequest) -> Result<CodecReport, CodecError> {
        let args = request.args();
        let report_path = request.report_path();

        // A report left over from an interrupted run must not be mistaken for ours
        match fs::remove_file(&report_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                tracing::warn!(path = %report_path.display(), error = %e, "could not remove stale report");
            }
            _ => {}
        }

        tracing::debug!(program = %self.program.display(), args = %args.join(" "), "running codec");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| CodecError::Spawn { program: self.program.clone(), source })?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
        .trim()
        .to_string();

        if !output.status.success() {
            return Err(CodecError::Failed { status: output.status.code(), output: combined });
        }

        let text = fs::read_to_string(&report_path).map_err(|source| CodecError::MissingReport {
            path: report_path.clone(),
            source,
            output: combined.clone(),
        })?;

        if let Err(e) = fs::remove_file(&report_path) {
            tracing::warn!(path = %report_path.display(), error = %e, "could not remove report");
        }

        CodecReport::parse(text).map_err(|reason| CodecError::MalformedReport { reason, output: combined })
    }
}
