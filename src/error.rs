//! Crate-wide error types.
//!
//! Mirrors the teacher's `fs::types::FsError` style: a flat `thiserror`
//! enum for leaf failures, composed into one top-level type. Command
//! failure and cancellation are deliberately NOT variants here — per the
//! spec's error taxonomy they are results (`RunnerResult`), not exceptions,
//! except when surfaced through `errexit`.

use std::path::PathBuf;
use thiserror::Error;

use crate::runner::RunnerResult;

/// Parse-time failure: unbalanced quotes or an unterminated heredoc.
/// Not usually surfaced to the caller directly — the interpreter retries
/// via the real-shell fallback and only raises this if that also fails.
#[derive(Debug, Clone, Error)]
#[error("shell: syntax error: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self { message: message.into(), position }
    }
}

/// Top-level error type returned by fallible, non-result-bearing
/// operations (spawn failures, internal invariant violations, and
/// `errexit`-triggered rejections).
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve working directory `{path}`: {source}")]
    Cwd {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised on the await path only, when `errexit` is set and the
    /// command completed with a non-zero code. Carries the full result so
    /// callers can still inspect captured output.
    #[error("command `{}` exited with code {}", .result.command, .result.code)]
    CommandFailed { result: Box<RunnerResult> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShellError {
    pub fn command_failed(result: RunnerResult) -> Self {
        ShellError::CommandFailed { result: Box::new(result) }
    }
}
