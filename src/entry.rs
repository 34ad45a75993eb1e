//! Public entry points (C9).
//!
//! Rust has no template-literal tag functions, so the host language's
//! `` $`cmd ${arg}` `` is realized the way other process-spawning Rust
//! crates expose their surface: a builder (`Shell`), plain functions, and
//! a `cmd!` convenience macro. Grounded in the teacher's `Bash::new`/
//! `Bash::exec` pairing (a configured instance plus one-shot free
//! functions), generalized over a real `Runner` instead of an in-memory
//! interpreter.

use std::path::PathBuf;

use crate::error::ShellError;
use crate::interp::{ExecContext, Interpreter};
use crate::quote::QuoteValue;
use crate::runner::{RunOptions, RunTarget, Runner};
use crate::settings::SettingsHandle;
use crate::vcmd::VirtualRegistry;

pub use crate::quote::{quote, raw};

/// A configured factory holding persistent defaults — analogous to the
/// teacher's `Bash::new(BashOptions)`. Every `Shell` owns its own
/// [`VirtualRegistry`] and [`SettingsHandle`], so two `Shell`s in the
/// same process never share `cd`/`set` state.
#[derive(Clone)]
pub struct Shell {
    interp: std::sync::Arc<Interpreter>,
    defaults: RunOptions,
    cwd: PathBuf,
    env: std::collections::HashMap<String, String>,
}

impl Shell {
    pub fn new(defaults: RunOptions) -> Self {
        Self {
            interp: std::sync::Arc::new(Interpreter::with_builtins(SettingsHandle::new())),
            defaults,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env: std::env::vars().collect(),
        }
    }

    pub fn registry_mut(&mut self) -> Option<&mut VirtualRegistry> {
        std::sync::Arc::get_mut(&mut self.interp).map(|i| i.registry_mut())
    }

    pub fn settings(&self) -> SettingsHandle {
        self.interp.settings.clone()
    }

    pub fn cd(&mut self, path: impl Into<PathBuf>) {
        self.cwd = path.into();
    }

    /// Parse `template` and return an unstarted [`Runner`] for it,
    /// threading this shell's cwd/env/settings through the interpreter.
    pub async fn sh(&self, template: &str) -> Result<Runner, ShellError> {
        self.sh_with(template, None).await
    }

    pub async fn sh_with(&self, template: &str, overrides: Option<RunOptions>) -> Result<Runner, ShellError> {
        let ctx = ExecContext::new(self.cwd.clone(), self.env.clone());
        let options = self.defaults.merged_with(overrides);
        // `eval_str_live` returns a `Runner` that is already driving the
        // underlying process/pipeline, so `.on()`/`.stream()` see bytes as
        // they're produced instead of only after the whole template has
        // run to completion. It also owns the parse-error-to-real-shell-
        // fallback decision, so a malformed-but-valid-for-bash template
        // (an unbalanced heredoc, say) still runs instead of rejecting
        // here. Only a pipeline/sequence/subshell falls back to the fully
        // buffered path internally, since those don't map onto one
        // `Runner` the way a single command does.
        let interp = self.interp.clone();
        interp.eval_str_live(template, ctx, options).await
    }

    /// Bypasses the parser entirely: `program`/`args` are never
    /// interpreted as shell syntax, so no quoting is needed or applied.
    pub fn exec(&self, program: &str, args: &[&str]) -> Runner {
        self.exec_with(program, args, None)
    }

    pub fn exec_with(&self, program: &str, args: &[&str], overrides: Option<RunOptions>) -> Runner {
        let target = RunTarget::Real { program: program.to_string(), args: args.iter().map(|s| s.to_string()).collect() };
        let options = self.defaults.merged_with(overrides);
        Runner::new(target, self.cwd.clone(), self.env.clone(), options)
    }
}

/// A process-wide default [`Shell`] backing the free functions below.
fn default_shell() -> &'static Shell {
    static SHELL: std::sync::OnceLock<Shell> = std::sync::OnceLock::new();
    SHELL.get_or_init(|| Shell::new(RunOptions::default()))
}

/// Parse and run `command` against the default shell's cwd/env.
pub async fn sh(command: &str) -> Result<Runner, ShellError> {
    default_shell().sh(command).await
}

/// Spawn `program` directly, bypassing the parser.
pub fn exec(program: &str, args: &[&str]) -> Runner {
    default_shell().exec(program, args)
}

/// Build a configured [`Shell`] with persistent defaults.
pub fn create(defaults: RunOptions) -> Shell {
    Shell::new(defaults)
}

/// Build a [`QuoteValue`] directly, skipping the `From` impls — useful
/// from the `cmd!` macro where the argument expression's type is not
/// known ahead of time.
pub fn value_of(v: impl Into<QuoteValue>) -> QuoteValue {
    v.into()
}

/// Interpolate a shell command template, quoting each argument, and parse
/// + run it against the default shell.
///
/// ```ignore
/// let result = shellstream::cmd!("echo {}", "hello world").await?;
/// ```
///
/// Quoting is always applied as if the placeholder were unflanked (the
/// macro cannot see the literal characters around `{}` the way a real
/// template-tag function can) — write `cmd!("echo {}", x)`, never
/// `cmd!("echo '{}'", x)`, and let the quoter decide whether quotes are
/// needed.
#[macro_export]
macro_rules! cmd {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {{
        let parts: Vec<String> = vec![$( $crate::entry::quote(&$crate::entry::value_of($arg), None) ),*];
        let mut parts_iter = parts.into_iter();
        let rendered = {
            let mut out = String::new();
            let mut chars = $fmt.chars().peekable();
            while let Some(c) = chars.next() {
    if c == '{' && chars.peek() == Some(&'}') {
                    chars.next();
                    out.push_str(&parts_iter.next().unwrap_or_default());
                } else {
                    out.push(c);
                }
            }
            out
        };
        $crate::entry::sh(&rendered)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sh_runs_a_virtual_builtin() {
        let shell = Shell::new(RunOptions::default());
        let runner = shell.sh("echo hi").await.unwrap();
        let result = runner.run(None).await;
        assert_eq!(result.text(), "hi\n");
    }

    #[tokio::test]
    async fn exec_bypasses_the_parser() {
        let shell = Shell::new(RunOptions::default());
        let result = shell.exec("echo", &["a;b"]).run(None).await;
        assert_eq!(result.text(), "a;b\n");
    }

    #[tokio::test]
    async fn cmd_macro_quotes_interpolated_arguments() {
        let result = cmd!("echo {}", "a b").await.unwrap().run(None).await;
        assert_eq!(result.text(), "a b\n");
    }

    /// `sh()` must hand back a runner that is already driving the process,
    /// not one that only starts once something awaits it — otherwise a
    /// command whose output is consumed purely through `.stream()`/`.on()`
    /// (and never `.run()`) would never produce anything.
    #[tokio::test]
    async fn sh_returns_a_live_runner_whose_output_streams_before_run_is_awaited() {
        let shell = Shell::new(RunOptions::default());
        let runner = shell.sh("yes hi").await.unwrap();
        let mut rx = runner.stream();
        let first = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("should receive a chunk without needing .run() first")
            .unwrap();
        assert_eq!(first.data, b"hi\n");
        runner.kill(libc::SIGTERM);
    }
}
