//! Virtual command registry and trait (C3) plus the built-in set (C4).
//!
//! Generalizes the teacher's `commands::types::Command` async-trait and
//! `commands::registry::CommandRegistry` almost verbatim — the shapes are
//! unchanged, only the context (real filesystem/environment instead of the
//! teacher's in-memory `FileSystem`) and result type (byte buffers instead
//! of `String`, since a virtual command can sit in a pipeline next to a
//! real process emitting arbitrary bytes) differ.

pub mod builtins;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a virtual command needs to run, threaded through by the
/// interpreter the way it threads arguments to a real `tokio::process::Command`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub args: Vec<String>,
    pub stdin: StdinInput,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

/// A virtual command's stdin: either already fully available (redirected
/// from a file, or a prior pipeline stage that already finished) or
/// arriving incrementally over a channel fed live by a still-running
/// upstream stage — the `mpsc::Receiver` half of the relay
/// `crate::runner::Runner::relay_into` sets up for a pipeline's `|` stages.
#[derive(Debug)]
pub enum StdinInput {
    Bytes(Vec<u8>),
    Channel(tokio::sync::mpsc::Receiver<Vec<u8>>),
}

impl Clone for StdinInput {
    /// A channel source has no meaningful clone (there is exactly one
    /// receiver); cloning degrades it to empty input, which only matters
    /// for `CommandContext: Clone`'s derive — no call site clones a
    /// context mid-flight.
    fn clone(&self) -> Self {
        match self {
            StdinInput::Bytes(b) => StdinInput::Bytes(b.clone()),
            StdinInput::Channel(_) => StdinInput::Bytes(Vec::new()),
        }
    }
}

impl StdinInput {
    pub fn empty() -> Self {
        StdinInput::Bytes(Vec::new())
    }

    /// Drains to completion, same as reading a fully materialized buffer
    /// once the upstream stage has nothing left to send.
    pub async fn collect(self) -> Vec<u8> {
        match self {
            StdinInput::Bytes(b) => b,
            StdinInput::Channel(mut rx) => {
                let mut buf = Vec::new();
                while let Some(chunk) = rx.recv().await {
                    buf.extend_from_slice(&chunk);
                }
                buf
            }
        }
    }

    /// Reads only until `min_lines` newlines have been seen (or the source
    /// is exhausted), then stops without draining the rest — used by
    /// `head` so piping an unbounded source (`yes`) into it doesn't
    /// require buffering the whole, infinite stream first. Dropping the
    /// receiver here, instead of reading it to `None`, is what lets the
    /// relay notice the downstream is done and cancel the upstream stage.
    pub async fn collect_lines(self, min_lines: usize) -> Vec<u8> {
        match self {
            StdinInput::Bytes(b) => b,
            StdinInput::Channel(mut rx) => {
                let mut buf = Vec::new();
                if min_lines == 0 {
                    return buf;
                }
                let mut seen = 0usize;
                while seen < min_lines {
                    match rx.recv().await {
                        Some(chunk) => {
                            seen += chunk.iter().filter(|&&b| b == b'\n').count();
                            buf.extend_from_slice(&chunk);
                        }
                        None => break,
                    }
                }
                buf
            }
        }
    }
}

/// Buffered result of a virtual command invocation.
///
/// `cwd_override` is how `cd` communicates a directory change back to the
/// interpreter — the interpreter threads a logical cwd across a `Sequence`
/// the same way the teacher's `cd_cmd.rs` mutates `InterpreterState.cwd`,
/// but here that state lives outside the command (virtual commands are
/// otherwise side-effect-isolated to their own context).
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub cwd_override: Option<PathBuf>,
}

impl CommandResult {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self { stdout: stdout.into(), exit_code: 0, ..Default::default() }
    }

    pub fn error(stderr: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self { stderr: stderr.into(), exit_code, ..Default::default() }
    }

    pub fn ok_empty() -> Self {
        Self::default()
    }
}

/// Pull-based chunk source for the handful of built-ins that never
/// terminate on their own (`yes`) or that block on the wall clock
/// (`sleep`) — spec.md §9's "generator-style streaming" design note,
/// realized as a trait rather than an `async fn` returning an opaque
/// `Stream`, since each implementor needs its own cancellation-aware
/// internal state (a counter for `yes`, a deadline for `sleep`).
#[async_trait]
pub trait ChunkSource: Send {
    /// Returns `None` once exhausted or cancelled.
    async fn next_chunk(&mut self, cancel: &CancellationToken) -> Option<Vec<u8>>;
}

/// What running a virtual command produces: either it is already done
/// (the common case — `cat`, `ls`, `echo`, ...) or it hands back a
/// [`ChunkSource`] the runner pulls from until cancellation or exhaustion.
pub enum CommandOutcome {
    Buffered(CommandResult),
    Streaming(Box<dyn ChunkSource>),
}

#[async_trait]
pub trait VirtualCommand: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: CommandContext) -> CommandOutcome;
}

/// Maps a lowercase command name to its handler. `Arc` (not `Box`, as the
/// teacher's `CommandRegistry` uses) because handlers are shared across
/// concurrently-running interpreters/runners in one process.
#[derive(Clone)]
pub struct VirtualRegistry {
    commands: HashMap<String, Arc<dyn VirtualCommand>>,
    enabled: bool,
}

impl VirtualRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new(), enabled: true }
    }

    /// A registry pre-populated with every built-in spec.md §4.3 names.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        builtins::register_all(&mut reg);
        reg
    }

    pub fn register(&mut self, cmd: Arc<dyn VirtualCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// `lookup` always returns `None` while the registry is disabled (see
    /// [`Self::disable_all`]), so the interpreter falls through to spawning
    /// a real process with the same name instead.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn VirtualCommand>> {
        if !self.enabled {
            return None;
        }
        self.commands.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }

    /// Retained for existing call sites; identical to [`Self::list`].
    pub fn names(&self) -> Vec<&str> {
        self.list()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Process-wide gate (spec.md §4.3): re-enables virtual-command lookup
    /// after [`Self::disable_all`].
    pub fn enable_all(&mut self) {
        self.enabled = true;
    }

    /// Process-wide gate: makes [`Self::lookup`] always return `None` without
    /// losing the registered handlers, so every command name falls through
    /// to a real process until [`Self::enable_all`] is called again.
    pub fn disable_all(&mut self) {
        self.enabled = false;
    }
}

impl Default for VirtualRegistry {
    fn default() -> Self {
        Self::new()
    }
}
