//! Interpreter (C6): walks a [`ShellNode`] tree, dispatching each command
//! to a virtual handler or a real process via [`Runner`], and threading
//! `cd`'s logical cwd across a sequence the way the teacher's
//! `interpreter::Interpreter` threads `InterpreterState` across AST nodes.

mod pipeline;
mod redirect;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ShellError;
use crate::runner::{RunOptions, RunTarget, Runner, RunnerResult};
use crate::settings::SettingsHandle;
use crate::shellast::{CommandNode, SequenceNode, SequenceOp, ShellNode};
use crate::vcmd::VirtualRegistry;

/// A command whose `Runner` has been built (and, for the live path,
/// started) but whose redirection/capture post-processing has not run
/// yet — the shared unit [`Interpreter::eval_command`] and
/// `pipeline::eval`'s concurrent stages both build and finish.
pub(crate) struct PreparedCommand {
    pub(crate) runner: Runner,
    plan: redirect::RedirectPlan,
    capture_requested: bool,
}

/// Mutable, per-sequence execution state: the logical cwd and environment
/// a `cd` or an assignment can update as the interpreter walks a
/// [`SequenceNode`] left to right. A [`ShellNode::Subshell`] clones this
/// and discards the clone's mutations on return — that is the entirety of
/// subshell isolation.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

impl ExecContext {
    pub fn new(cwd: PathBuf, env: HashMap<String, String>) -> Self {
        Self { cwd, env }
    }

    pub fn from_host() -> std::io::Result<Self> {
        Ok(Self { cwd: std::env::current_dir()?, env: std::env::vars().collect() })
    }
}

pub struct Interpreter {
    registry: VirtualRegistry,
    pub(crate) settings: SettingsHandle,
}

impl Interpreter {
    pub fn new(registry: VirtualRegistry, settings: SettingsHandle) -> Self {
        Self { registry, settings }
    }

    pub fn with_builtins(settings: SettingsHandle) -> Self {
        Self::new(VirtualRegistry::with_builtins(), settings)
    }

    pub fn registry(&self) -> &VirtualRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut VirtualRegistry {
        &mut self.registry
    }

    /// Parse and evaluate `src`. A parse error (unbalanced quotes or an
    /// unterminated heredoc, per spec.md §7) is not surfaced to the caller
    /// here — it is resolved by falling back to a real shell over the
    /// original string, bash-parity for the user, and only turns into a
    /// visible error if that execution itself fails under `errexit`.
    pub async fn eval_str(
        &self,
        src: &str,
        ctx: &mut ExecContext,
        options: &RunOptions,
    ) -> Result<RunnerResult, ShellError> {
        match crate::shparser::parse(src) {
            Ok(node) => self.eval(&node, ctx, options).await,
            Err(_) => self.eval_raw(src, ctx, options).await,
        }
    }

    /// Evaluate any node. Boxed/pinned because `Subshell` and real-shell
    /// fallback recurse through this same entry point.
    pub fn eval<'a>(
        &'a self,
        node: &'a ShellNode,
        ctx: &'a mut ExecContext,
        options: &'a RunOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<RunnerResult, ShellError>> + Send + 'a>> {
        Box::pin(async move {
            match node {
                ShellNode::Command(cmd) => self.eval_command(cmd, ctx, options).await,
                ShellNode::Pipeline(p) => pipeline::eval(self, p, ctx, options).await,
                ShellNode::Sequence(seq) => self.eval_sequence(seq, ctx, options).await,
                ShellNode::Subshell(inner) => {
                    let mut sub_ctx = ctx.clone();
                    self.eval(inner, &mut sub_ctx, options).await
                }
                ShellNode::Raw(src) => self.eval_raw(src, ctx, options).await,
            }
        })
    }

    /// Build a command's `Runner` and redirection plan without starting or
    /// awaiting it — split out of [`Self::eval_command`] so
    /// `pipeline::eval` can start every stage's runner up front and relay
    /// stdout concurrently instead of buffering each stage to completion
    /// before the next one starts.
    ///
    /// `capture` is always forced on internally: a redirection target
    /// needs the captured bytes to write to a file even when the caller
    /// asked for `capture: false`, and a non-final pipeline stage needs
    /// them to relay downstream. [`Self::finish_command`] nulls
    /// `result.stdout`/`.stderr` back out afterward if the caller's
    /// original setting was `false`, preserving the "absent, not empty
    /// string" invariant for that case.
    pub(crate) async fn prepare_command(
        &self,
        node: &CommandNode,
        ctx: &ExecContext,
        options: &RunOptions,
    ) -> Result<PreparedCommand, ShellError> {
        let plan = redirect::plan(&node.redirections, &ctx.cwd);
        let capture_requested = options.capture;

        let mut stage_options = options.clone();
        stage_options.capture = true;
        stage_options.cwd = Some(ctx.cwd.clone());
        stage_options.env = Some(ctx.env.clone());
        if let Some(stdin) = redirect::resolve_stdin(&plan).await? {
            stage_options.stdin = stdin;
        }

        let settings = self.settings.snapshot();
        if settings.verbose || settings.xtrace {
            let line = std::iter::once(node.program.as_str())
                .chain(node.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            if settings.verbose {
                eprintln!("{line}");
            }
            if settings.xtrace {
                eprintln!("+ {line}");
            }
        }

        let target = match self.registry.lookup(&node.program) {
            Some(cmd) => RunTarget::Virtual { cmd, args: node.args.clone() },
            None => RunTarget::Real { program: node.program.clone(), args: node.args.clone() },
        };

        let runner = Runner::new(target, ctx.cwd.clone(), ctx.env.clone(), stage_options);
        Ok(PreparedCommand { runner, plan, capture_requested })
    }

    /// Await a prepared command's runner, apply its redirection plan, fold
    /// a `cd` override back into `ctx`, and restore the caller's original
    /// `capture` setting.
    pub(crate) async fn finish_command(
        &self,
        prepared: PreparedCommand,
        ctx: &mut ExecContext,
    ) -> Result<RunnerResult, ShellError> {
        let mut result = prepared.runner.run(None).await;
        redirect::apply(&prepared.plan, &mut result).await?;

        if let Some(new_cwd) = result.cwd_override.take() {
            ctx.cwd = new_cwd;
        }

        if !prepared.capture_requested {
            result.stdout = None;
            result.stderr = None;
        }

        if self.settings.snapshot().errexit && result.failed {
            return Err(ShellError::command_failed(result));
        }
        Ok(result)
    }

    pub(crate) async fn eval_command(
        &self,
        node: &CommandNode,
        ctx: &mut ExecContext,
        options: &RunOptions,
    ) -> Result<RunnerResult, ShellError> {
        let prepared = self.prepare_command(node, ctx, options).await?;
        prepared.runner.start();
        self.finish_command(prepared, ctx).await
    }

    /// Like [`Self::eval_str`], but for the common case of a single
    /// command (no pipeline/sequence/subshell) returns a live [`Runner`]
    /// already driving the process instead of evaluating it to completion
    /// first — so `.on()`/`.stream()` see every byte as it is produced.
    /// Falls back to the fully-buffered path (evaluate to completion, wrap
    /// with [`Runner::already_finished`]) for anything with more than one
    /// stage, since a pipeline/sequence/subshell doesn't map onto a single
    /// `Runner` at all.
    pub async fn eval_str_live(
        &self,
        src: &str,
        mut ctx: ExecContext,
        options: RunOptions,
    ) -> Result<Runner, ShellError> {
        match crate::shparser::parse(src) {
            Ok(ShellNode::Command(cmd)) => self.live_command(&cmd, ctx, options).await,
            Ok(ShellNode::Raw(raw_src)) => Ok(self.live_raw(&raw_src, &ctx, options)),
            Ok(node) => {
                let result = self.eval(&node, &mut ctx, &options).await?;
                Ok(Runner::already_finished(result))
            }
            Err(_) => Ok(self.live_raw(src, &ctx, options)),
        }
    }

    /// A single command has no following command to short-circuit via
    /// `errexit`, so there is nothing `finish_command`'s `Err` path would
    /// change here — the failure is already visible as
    /// `result.failed`/`result.code` on the `Runner` itself once it
    /// finishes.
    async fn live_command(&self, node: &CommandNode, ctx: ExecContext, options: RunOptions) -> Result<Runner, ShellError> {
        let prepared = self.prepare_command(node, &ctx, &options).await?;
        let runner = prepared.runner.clone();
        runner.start();
        if prepared.plan.has_output_targets() || !prepared.capture_requested {
            let finalize = runner.clone();
            tokio::spawn(async move {
                let mut result = finalize.run(None).await;
                let _ = redirect::apply(&prepared.plan, &mut result).await;
                if !prepared.capture_requested {
                    result.stdout = None;
                    result.stderr = None;
                }
                finalize.finalize_result(result);
            });
        }
        Ok(runner)
    }

    /// Real-shell fallback as a live runner: the whole string (including
    /// any redirections within it) is handed to `/bin/sh -c` verbatim, so
    /// there is no redirection plan of our own to apply afterward.
    fn live_raw(&self, src: &str, ctx: &ExecContext, options: RunOptions) -> Runner {
        let target = RunTarget::Real { program: "/bin/sh".to_string(), args: vec!["-c".to_string(), src.to_string()] };
        let mut stage_options = options.clone();
        stage_options.cwd = Some(ctx.cwd.clone());
        stage_options.env = Some(ctx.env.clone());
        let runner = Runner::new(target, ctx.cwd.clone(), ctx.env.clone(), stage_options);
        runner.start();
        runner
    }

    async fn eval_sequence(
        &self,
        node: &SequenceNode,
        ctx: &mut ExecContext,
        options: &RunOptions,
    ) -> Result<RunnerResult, ShellError> {
        let mut last = self.eval(&node.first, ctx, options).await?;
        for (op, next) in &node.rest {
            let run_next = match op {
                SequenceOp::And => !last.failed,
                SequenceOp::Or => last.failed,
                SequenceOp::Semi => true,
            };
            if run_next {
                last = self.eval(next, ctx, options).await?;
            }
        }
        Ok(last)
    }

    /// Syntax the reduced parser does not own — arithmetic expansion,
    /// compound keywords, process substitution, and the like — is handed
    /// to a real shell verbatim.
    async fn eval_raw(&self, src: &str, ctx: &mut ExecContext, options: &RunOptions) -> Result<RunnerResult, ShellError> {
        let target = RunTarget::Real { program: "/bin/sh".to_string(), args: vec!["-c".to_string(), src.to_string()] };
        let mut stage_options = options.clone();
        stage_options.capture = true;
        stage_options.cwd = Some(ctx.cwd.clone());
        stage_options.env = Some(ctx.env.clone());
        let runner = Runner::new(target, ctx.cwd.clone(), ctx.env.clone(), stage_options);
        let result = runner.run(None).await;
        if self.settings.snapshot().errexit && result.failed {
            return Err(ShellError::command_failed(result));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shellast::ShellNode;

    fn ctx() -> ExecContext {
        ExecContext::new(std::env::temp_dir(), std::env::vars().collect())
    }

    #[tokio::test]
    async fn virtual_echo_runs_through_registry() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let node = ShellNode::command("echo", vec!["hi".to_string()]);
        let mut c = ctx();
        let result = interp.eval(&node, &mut c, &RunOptions::default()).await.unwrap();
        assert_eq!(result.text(), "hi\n");
    }

    #[tokio::test]
    async fn and_or_sequence_short_circuits() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let node = crate::shparser::parse("false && echo nope || echo yep").unwrap();
        let mut c = ctx();
        let result = interp.eval(&node, &mut c, &RunOptions::default()).await.unwrap();
        assert_eq!(result.text(), "yep\n");
    }

    #[tokio::test]
    async fn cd_updates_context_cwd_across_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let script = format!("cd {} && pwd", dir.path().to_string_lossy());
        let node = crate::shparser::parse(&script).unwrap();
        let mut c = ctx();
        let result = interp.eval(&node, &mut c, &RunOptions::default()).await.unwrap();
        let canonical = tokio::fs::canonicalize(dir.path()).await.unwrap();
        assert_eq!(result.text().trim(), canonical.to_string_lossy());
    }

    #[tokio::test]
    async fn subshell_cwd_change_does_not_escape() {
        let dir = tempfile::tempdir().unwrap();
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let script = format!("(cd {} ) && pwd", dir.path().to_string_lossy());
        let node = crate::shparser::parse(&script).unwrap();
        let mut c = ctx();
        let start = c.cwd.clone();
        let result = interp.eval(&node, &mut c, &RunOptions::default()).await.unwrap();
        assert_eq!(result.text().trim(), start.to_string_lossy());
    }

    #[tokio::test]
    async fn unbalanced_quote_falls_back_to_real_shell_instead_of_erroring() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let mut c = ctx();
        // An unbalanced single quote is a parse error in the reduced
        // grammar but valid as a `/bin/sh -c` argument once the whole
        // string is handed over verbatim.
        let result = interp.eval_str("echo 'unterminated", &mut c, &RunOptions::default()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pipeline_threads_stdout_into_next_stdin() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let node = crate::shparser::parse("echo hello | grep hello").unwrap();
        let mut c = ctx();
        let result = interp.eval(&node, &mut c, &RunOptions::default()).await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.text(), "hello\n");
    }

    /// `yes` never terminates on its own; this only completes if the
    /// pipeline relays stdout live and `head` cancels `yes` once it has
    /// enough lines, rather than buffering `yes`'s output to completion
    /// first (which would hang this test forever).
    #[tokio::test]
    async fn pipeline_with_unbounded_producer_terminates_via_bounded_consumer() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let node = crate::shparser::parse("yes | head -n 3").unwrap();
        let mut c = ctx();
        let result =
            tokio::time::timeout(std::time::Duration::from_secs(5), interp.eval(&node, &mut c, &RunOptions::default()))
                .await
                .expect("pipeline should terminate instead of hanging")
                .unwrap();
        assert_eq!(result.text(), "y\ny\ny\n");
    }

    #[tokio::test]
    async fn eval_str_live_returns_runner_without_buffering_first() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let c = ctx();
        let runner = interp.eval_str_live("echo hi", c, RunOptions::default()).await.unwrap();
        let result = runner.run(None).await;
        assert_eq!(result.text(), "hi\n");
    }

    #[tokio::test]
    async fn capture_false_leaves_stdout_and_stderr_absent() {
        let interp = Interpreter::with_builtins(SettingsHandle::new());
        let node = ShellNode::command("echo", vec!["hi".to_string()]);
        let mut c = ctx();
        let options = RunOptions { capture: false, ..RunOptions::default() };
        let result = interp.eval(&node, &mut c, &options).await.unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }
}
