//! Thin adapter for callers porting from an `execa`-shaped API.
//!
//! Not a reimplementation — every function here is a couple of lines
//! wrapping [`crate::entry`] and [`crate::runner::RunnerResult`], renaming
//! fields/types to match the shapes that ecosystem expects.

use crate::entry::Shell;
use crate::runner::{RunOptions, RunnerResult};

/// `execa`'s resolved-promise shape: `{ stdout, stderr, exitCode, failed }`
/// becomes this struct, built straight from a [`RunnerResult`].
#[derive(Debug, Clone)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub failed: bool,
}

impl From<RunnerResult> for Output {
    fn from(r: RunnerResult) -> Self {
        Self {
            stdout: r.stdout.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default(),
            stderr: r.stderr.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default(),
            exit_code: r.code,
            failed: r.failed,
        }
    }
}

/// `execa`'s rejection shape for a failed/`errexit`-style invocation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("command failed with exit code {exit_code}: {stderr}")]
pub struct ExecaError {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl From<RunnerResult> for ExecaError {
    fn from(r: RunnerResult) -> Self {
        Self {
            exit_code: r.code,
            stdout: r.stdout.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default(),
            stderr: r.stderr.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default(),
        }
    }
}

/// `execa(file, args)`-shaped entry point: run `program` directly (no
/// shell parsing) and resolve to [`Output`], rejecting with
/// [`ExecaError`] on a non-zero exit the way `execa` rejects by default.
pub async fn execa(program: &str, args: &[&str]) -> Result<Output, ExecaError> {
    let shell = Shell::new(RunOptions::default());
    let result = shell.exec(program, args).run(None).await;
    if result.failed {
        Err(result.into())
    } else {
        Ok(result.into())
    }
}

/// `execaCommand(command)`-shaped entry point: parse `command` as a
/// shell template (built-ins, pipelines, redirections all apply) instead
/// of spawning one program directly.
pub async fn execa_command(command: &str) -> Result<Output, ExecaError> {
    let shell = Shell::new(RunOptions::default());
    let runner = shell.sh(command).await.map_err(|e| ExecaError { exit_code: 1, stdout: String::new(), stderr: e.to_string() })?;
    let result = runner.run(None).await;
    if result.failed {
        Err(result.into())
    } else {
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execa_returns_output_on_success() {
        let out = execa("echo", &["hi"]).await.unwrap();
        assert_eq!(out.stdout, "hi\n");
        assert!(!out.failed);
    }

    #[tokio::test]
    async fn execa_rejects_on_nonzero_exit() {
        let err = execa("false", &[]).await.unwrap_err();
        assert_eq!(err.exit_code, 1);
    }

    #[tokio::test]
    async fn execa_command_runs_a_pipeline() {
        let out = execa_command("echo hi | grep hi").await.unwrap();
        assert_eq!(out.stdout, "hi\n");
    }
}
