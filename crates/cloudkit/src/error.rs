//! Error types for cloud and cluster operations.

use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while talking to the vendor CLIs or kubectl.
#[derive(Debug, Error)]
pub enum Error {
    /// The vendor CLI could not be started (missing binary, bad permissions).
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that could not be started
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The vendor CLI ran but exited non-zero.
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        /// Program that failed
        program: String,
        /// Exit status of the failed invocation
        status: ExitStatus,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// A Kubernetes API object could not be parsed or rewritten.
    #[error("malformed {kind} object: {message}")]
    MalformedObject {
        /// Object kind (e.g. "Namespace")
        kind: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
