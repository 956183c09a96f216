//! Error types for relay-engine.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the external git tool.
///
/// `Display` is the short public summary; the captured process output is
/// carried separately so status reporting can attach it as a distinct field.
#[derive(Debug, Error)]
pub enum GitError {
    /// The process ran and exited unsuccessfully.
    #[error("git {operation}: {status}")]
    CommandFailed {
        operation: &'static str,
        status: String,
        output: String,
    },

    /// The process exceeded the per-operation timeout and was killed.
    #[error("git {operation} timed out after {seconds}s")]
    TimedOut {
        operation: &'static str,
        seconds: u64,
    },

    /// The process could not be spawned at all.
    #[error("could not run git {operation}: {source}")]
    Spawn {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The head reference file could not be read from the working directory.
    #[error("could not read head ref {path}: {source}")]
    RefRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GitError {
    /// Combined process output, when the operation got far enough to produce
    /// any.
    pub fn output(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}
