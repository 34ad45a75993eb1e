//! Redirection application (§4.6's redirection clause).
//!
//! Grounded on `other_examples/..alfredjeanlab-oddjobs..exec-run.rs`'s
//! `redirect::apply_redirections`, which wires `>`/`>>`/`<`/`2>&1` onto a
//! `tokio::process::Command` before spawn. This crate's [`super::super::runner::Runner`]
//! already owns stdio wiring internally (it has to, to support virtual
//! commands that have no OS-level file descriptors at all), so redirections
//! here are realized as a buffer-then-write pass instead: run the command
//! with output captured, then route the captured bytes to files exactly as
//! the redirection list specifies. This trades true zero-copy streaming to
//! a file for one simple code path that treats real and virtual commands
//! identically.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::ShellError;
use crate::runner::{RunnerResult, StdinSource};
use crate::shellast::{RedirectKind, RedirectTarget, RedirectionNode};

#[derive(Debug, Clone)]
enum StdinPlan {
    FromFile(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RedirectPlan {
    stdin_plan: Option<StdinPlan>,
    stdout_targets: Vec<(PathBuf, bool)>,
    stderr_targets: Vec<(PathBuf, bool)>,
    dup_stderr_to_stdout: bool,
}

/// Build a plan from a command's redirection list, resolving relative
/// paths against `cwd` the way a real shell resolves them against its own
/// working directory at the point the redirection is parsed.
pub(crate) fn plan(redirections: &[RedirectionNode], cwd: &Path) -> RedirectPlan {
    let mut out = RedirectPlan::default();
    for r in redirections {
        match &r.kind {
            RedirectKind::ToFile { path, append, target } => {
                let resolved = cwd.join(path);
                match target {
                    RedirectTarget::Stdout => out.stdout_targets.push((resolved, *append)),
                    RedirectTarget::Stderr => out.stderr_targets.push((resolved, *append)),
                    RedirectTarget::Both => {
                        out.stdout_targets.push((resolved.clone(), *append));
                        out.stderr_targets.push((resolved, *append));
                    }
                }
            }
            RedirectKind::FromFile { path } => {
                out.stdin_plan = Some(StdinPlan::FromFile(cwd.join(path)));
            }
            RedirectKind::Heredoc { body } => {
                out.stdin_plan = Some(StdinPlan::Bytes(body.clone().into_bytes()));
            }
            RedirectKind::HereString { content } => {
                out.stdin_plan = Some(StdinPlan::Bytes(format!("{content}\n").into_bytes()));
            }
            RedirectKind::DupStderrToStdout => out.dup_stderr_to_stdout = true,
        }
    }
    out
}

impl RedirectPlan {
    /// Whether applying this plan needs the command's own captured output
    /// at all — used to decide whether a live-streaming runner needs a
    /// buffered finalization pass or can be returned exactly as the
    /// process/virtual command itself produced it.
    pub(crate) fn has_output_targets(&self) -> bool {
        !self.stdout_targets.is_empty() || !self.stderr_targets.is_empty() || self.dup_stderr_to_stdout
    }
}

/// Resolve this plan's stdin source into something a [`RunOptions`] can
/// carry. Reads `< file` redirections eagerly since [`plan`] itself cannot
/// be async (it runs inside synchronous AST-walking code).
pub(crate) async fn resolve_stdin(plan: &RedirectPlan) -> Result<Option<StdinSource>, ShellError> {
    match &plan.stdin_plan {
        None => Ok(None),
        Some(StdinPlan::Bytes(b)) => Ok(Some(StdinSource::Bytes(b.clone()))),
        Some(StdinPlan::FromFile(path)) => {
            let bytes = tokio::fs::read(path).await.map_err(|source| ShellError::Cwd { path: path.clone(), source })?;
            Ok(Some(StdinSource::Bytes(bytes)))
        }
    }
}

/// Apply the plan to an already-completed result: merge streams, then
/// write each targeted file. Mutates `result`'s captured buffers so a
/// caller that also wants the text still sees post-redirection content
/// (e.g. after `2>&1`, `result.stderr` reads the merged bytes too).
pub(crate) async fn apply(plan: &RedirectPlan, result: &mut RunnerResult) -> Result<(), ShellError> {
    if plan.dup_stderr_to_stdout {
        let mut merged = result.stdout.clone().unwrap_or_default();
        merged.extend_from_slice(result.stderr.as_deref().unwrap_or_default());
        result.stdout = Some(merged.clone());
        result.stderr = Some(merged);
    }

    for (path, append) in &plan.stdout_targets {
        write_target(path, *append, result.stdout.as_deref().unwrap_or_default()).await?;
    }
    for (path, append) in &plan.stderr_targets {
        write_target(path, *append, result.stderr.as_deref().unwrap_or_default()).await?;
    }
    Ok(())
}

async fn write_target(path: &Path, append: bool, bytes: &[u8]) -> Result<(), ShellError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    let mut file = options.open(path).await.map_err(|source| ShellError::Cwd { path: path.to_path_buf(), source })?;
    file.write_all(bytes).await.map_err(|source| ShellError::Cwd { path: path.to_path_buf(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunnerResult;

    #[tokio::test]
    async fn to_file_truncate_writes_captured_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        let nodes = vec![RedirectionNode {
            kind: RedirectKind::ToFile { path: file.to_string_lossy().to_string(), append: false, target: RedirectTarget::Stdout },
        }];
        let plan = plan(&nodes, Path::new("/"));
        let mut result = RunnerResult { stdout: Some(b"hello\n".to_vec()), ..Default::default() };
        apply(&plan, &mut result).await.unwrap();
        let contents = tokio::fs::read_to_string(&file).await.unwrap();
        assert_eq!(contents, "hello\n");
    }

    #[tokio::test]
    async fn dup_stderr_to_stdout_merges_streams() {
        let nodes = vec![RedirectionNode { kind: RedirectKind::DupStderrToStdout }];
        let plan = plan(&nodes, Path::new("/"));
        let mut result = RunnerResult {
            stdout: Some(b"out\n".to_vec()),
            stderr: Some(b"err\n".to_vec()),
            ..Default::default()
        };
        apply(&plan, &mut result).await.unwrap();
        assert_eq!(result.stdout.unwrap(), b"out\nerr\n");
    }

    #[tokio::test]
    async fn heredoc_resolves_to_stdin_bytes() {
        let nodes = vec![RedirectionNode { kind: RedirectKind::Heredoc { body: "line one\nline two\n".to_string() } }];
        let plan = plan(&nodes, Path::new("/"));
        let stdin = resolve_stdin(&plan).await.unwrap();
        match stdin {
            Some(StdinSource::Bytes(b)) => assert_eq!(b, b"line one\nline two\n"),
            _ => panic!("expected bytes stdin"),
        }
    }

    #[tokio::test]
    async fn append_adds_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        tokio::fs::write(&file, b"first\n").await.unwrap();
        let nodes = vec![RedirectionNode {
            kind: RedirectKind::ToFile { path: file.to_string_lossy().to_string(), append: true, target: RedirectTarget::Stdout },
        }];
        let plan = plan(&nodes, Path::new("/"));
        let mut result = RunnerResult { stdout: Some(b"second\n".to_vec()), ..Default::default() };
        apply(&plan, &mut result).await.unwrap();
        let contents = tokio::fs::read_to_string(&file).await.unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
