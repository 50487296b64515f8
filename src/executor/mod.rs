//! External process execution with output capture and bounded retries.
//!
//! Helm and terraform conflate "nothing to do" with real failure in their
//! exit codes, so this module captures everything a command prints, shows
//! the operator a one-dot-per-line heartbeat instead of the raw flood, and
//! lets each call site decide from the captured text whether a non-zero
//! exit was actually an acceptable no-op.

pub mod command;
#[cfg(test)]
pub mod fake;
pub mod output;
pub mod retry;

pub use command::{CommandSpec, ProcessRunner, ShellRunner};
pub use output::OutputCapture;
pub use retry::{Executor, Suppression};

use std::process::ExitStatus;
use thiserror::Error;

/// Errors from a single external command attempt.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command could not be started at all.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that could not be started
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited non-zero.
    #[error("{program} exited with {status}")]
    Failed {
        /// Program that failed
        program: String,
        /// Its exit status
        status: ExitStatus,
    },

    /// Output streaming failed mid-attempt (pipe or sink error).
    #[error("IO error while streaming command output: {0}")]
    Io(#[from] std::io::Error),
}
