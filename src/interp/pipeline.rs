//! Pipeline execution (§4.6): wire one stage's stdout into the next
//! stage's stdin, left to right, with every stage running concurrently
//! rather than one at a time.
//!
//! Grounded on `other_examples/..alfredjeanlab-oddjobs..exec-run.rs`'s
//! `execute_job`, which spawns every stage up front and relays file
//! descriptors directly. This crate's stages can be virtual commands with
//! no file descriptor at all, so the relay here goes through
//! `crate::runner::relay_stdout`'s broadcast-channel bridge instead of a
//! real pipe — but the shape is the same: every stage starts immediately,
//! and bytes move downstream as the upstream stage produces them instead
//! of only after it exits. `yes | head -3` terminates because `head`
//! drops its stdin receiver early, which `relay_stdout` turns into a
//! `SIGTERM` against `yes`.

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::error::ShellError;
use crate::runner::{relay_stdout, RunOptions, RunnerResult, StdinSource};
use crate::shellast::PipelineNode;

use super::{ExecContext, Interpreter};

pub(crate) async fn eval(
    interp: &Interpreter,
    node: &PipelineNode,
    ctx: &mut ExecContext,
    options: &RunOptions,
) -> Result<RunnerResult, ShellError> {
    let pipefail = interp.settings.snapshot().pipefail;
    let last = node.stages.len().saturating_sub(1);

    // Phase one: build and start every stage up front, wiring each
    // non-final stage's live output into the next stage's stdin via a
    // relay channel before awaiting anything. This is what makes the
    // pipeline concurrent instead of buffer-then-thread.
    let mut prepared_stages = Vec::with_capacity(node.stages.len());
    let mut next_stdin: Option<StdinSource> = None;

    for (i, stage) in node.stages.iter().enumerate() {
        let mut stage_options = options.clone();
        if let Some(stdin) = next_stdin.take() {
            stage_options.stdin = stdin;
        }

        let prepared = interp.prepare_command(stage, ctx, &stage_options).await?;
        let runner = prepared.runner.clone();
        runner.start();

        if i != last {
            let rx = relay_stdout(&runner, node.merge_stderr);
            next_stdin = Some(StdinSource::Relay(Arc::new(AsyncMutex::new(Some(rx)))));
        }

        prepared_stages.push(prepared);
    }

    // Phase two: now that every stage is already running concurrently,
    // await each in turn and apply its own redirection/capture
    // finalization. Awaiting left to right (rather than all at once)
    // preserves `errexit`'s "stop at the first stage that fails" rule and
    // `cd`'s left-to-right `ExecContext` threading, without affecting how
    // fast any stage itself runs — every stage is already driving its
    // process in the background by this point.
    let mut stage_results = Vec::with_capacity(prepared_stages.len());
    for prepared in prepared_stages {
        let capture_requested = prepared.capture_requested;
        let mut result = interp.finish_command(prepared, ctx).await?;
        if node.merge_stderr && capture_requested {
            let mut merged = result.stdout.clone().unwrap_or_default();
            merged.extend_from_slice(result.stderr.as_deref().unwrap_or_default());
            result.stdout = Some(merged.clone());
            result.stderr = Some(merged);
        }
        stage_results.push(result);
    }

    Ok(select_result(stage_results, pipefail))
}

/// Bash's own rule: without `pipefail`, the pipeline's status is the last
/// stage's status. With `pipefail`, it is the rightmost nonzero status, or
/// 0 if every stage succeeded.
fn select_result(mut stage_results: Vec<RunnerResult>, pipefail: bool) -> RunnerResult {
    if !pipefail {
        return stage_results.pop().expect("pipeline always has at least one stage");
    }
    stage_results
        .iter()
        .rev()
        .find(|r| r.failed)
        .cloned()
        .unwrap_or_else(|| stage_results.last().cloned().expect("pipeline always has at least one stage"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: i32) -> RunnerResult {
        RunnerResult::finished("stage".to_string(), code, None, false)
    }

    #[test]
    fn without_pipefail_status_is_last_stage() {
        let r = select_result(vec![result(1), result(0)], false);
        assert_eq!(r.code, 0);
    }

    #[test]
    fn with_pipefail_status_is_rightmost_failure() {
        let r = select_result(vec![result(1), result(0), result(2), result(0)], true);
        assert_eq!(r.code, 2);
    }

    #[test]
    fn with_pipefail_all_success_is_zero() {
        let r = select_result(vec![result(0), result(0)], true);
        assert_eq!(r.code, 0);
    }
}
