//! ProcessRunner (C5).
//!
//! A deferred, awaitable, multi-consumer handle over either a real child
//! process or a virtual command, implementing the full contract table of
//! spec.md §4.4. Internals are grounded in
//! `other_examples/..romeoahmed-mob-rs..process-runner.rs`'s
//! `ProcessBuilder::run`/`run_with_cancellation` shape (build command, spawn,
//! relay stdio, wait, classify exit code), generalized with the
//! deferred/multi-consumer/event contract the teacher's `Bash::exec`
//! async-with-sync-path duality also models at the top level.

pub mod child;
pub mod events;
pub mod options;
pub mod result;

use std::future::{Future, IntoFuture};
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command as TokioCommand;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::vcmd::{CommandContext, CommandOutcome, StdinInput, VirtualCommand};

pub use child::ChildHandle;
pub use events::{Chunk, ChunkStream, EventKind, EventPayload, ListenerFn};
pub use options::{RunMode, RunOptions, StdinSource};
pub use result::RunnerResult;

use events::EventEmitter;
use result::signal_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    Pending,
    Starting,
    Running,
    Finishing,
    Finished,
}

/// What a runner ultimately executes: a real program or a registered
/// virtual command. `args` is split out from `program`/`cmd` so redirection
/// handling in `interp` can rewrite it without reconstructing the whole
/// target.
#[derive(Clone)]
pub enum RunTarget {
    Real { program: String, args: Vec<String> },
    Virtual { cmd: Arc<dyn VirtualCommand>, args: Vec<String> },
}

impl RunTarget {
    fn command_label(&self) -> String {
        match self {
            RunTarget::Real { program, args } => {
                std::iter::once(program.clone()).chain(args.iter().cloned()).collect::<Vec<_>>().join(" ")
            }
            RunTarget::Virtual { cmd, args } => {
                std::iter::once(cmd.name().to_string()).chain(args.iter().cloned()).collect::<Vec<_>>().join(" ")
            }
        }
    }
}

struct RunnerInner {
    state: RunnerState,
    options: RunOptions,
    result: Option<RunnerResult>,
    child_handle: ChildHandle,
}

struct RunnerShared {
    target: RunTarget,
    cwd: PathBuf,
    env: std::collections::HashMap<String, String>,
    inner: Mutex<RunnerInner>,
    events: EventEmitter,
    stdout_tx: tokio::sync::broadcast::Sender<Vec<u8>>,
    stderr_tx: tokio::sync::broadcast::Sender<Vec<u8>>,
    stdout_buf: Mutex<Vec<u8>>,
    stderr_buf: Mutex<Vec<u8>>,
    cancel: CancellationToken,
    done: Notify,
    started: AtomicBool,
}

/// The public handle. Cheaply `Clone`: every clone shares the same
/// execution, satisfying the "at most once spawn" invariant.
#[derive(Clone)]
pub struct Runner(Arc<RunnerShared>);

impl Runner {
    pub fn new(target: RunTarget, cwd: PathBuf, env: std::collections::HashMap<String, String>, options: RunOptions) -> Self {
        let (stdout_tx, _) = tokio::sync::broadcast::channel(256);
        let (stderr_tx, _) = tokio::sync::broadcast::channel(256);
        Self(Arc::new(RunnerShared {
            target,
            cwd,
            env,
            inner: Mutex::new(RunnerInner {
                state: RunnerState::Pending,
                options,
                result: None,
                child_handle: ChildHandle::Virtual,
            }),
            events: EventEmitter::new(),
            stdout_tx,
            stderr_tx,
            stdout_buf: Mutex::new(Vec::new()),
            stderr_buf: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            done: Notify::new(),
            started: AtomicBool::new(false),
        }))
    }

    /// Wrap an already-computed result as a pre-finished runner. Used by
    /// [`crate::entry::Shell::sh`], where a full command tree (pipeline,
    /// sequence, or subshell) has already run to completion via the
    /// interpreter before the caller ever sees a `Runner` — every entry
    /// point still hands back the same `Runner` surface, so `.run()`,
    /// `.strings_stdout()`, and friends work uniformly regardless of how
    /// many real processes a template actually spawned.
    pub fn already_finished(result: RunnerResult) -> Self {
        // The target is never driven (state is forced to `Finished` below
        // before anything spawns it), so any registered no-op virtual
        // command is a fine placeholder — `true` always is one.
        let cmd = crate::vcmd::VirtualRegistry::with_builtins().lookup("true").expect("true is always registered");
        let target = RunTarget::Virtual { cmd, args: Vec::new() };
        let runner = Self::new(target, std::env::temp_dir(), Default::default(), RunOptions::default().quiet());
        {
            let mut inner = runner.0.inner.lock().expect("runner lock poisoned");
            inner.state = RunnerState::Finished;
            inner.result = Some(result);
        }
        runner.0.started.store(true, Ordering::SeqCst);
        runner
    }

    pub fn child(&self) -> ChildHandle {
        self.0.inner.lock().expect("runner lock poisoned").child_handle
    }

    /// Whether this runner has already resolved to a [`RunnerResult`] —
    /// used by [`crate::coordinator::Coordinator::reap`] to drop runners
    /// that no longer need a forwarded signal.
    pub fn is_finished(&self) -> bool {
        self.0.inner.lock().expect("runner lock poisoned").result.is_some()
    }

    pub fn on(&self, kind: EventKind, f: ListenerFn) -> Self {
        self.0.events.on(kind, f);
        self.start();
        self.clone()
    }

    pub fn off(&self, kind: EventKind, f: &ListenerFn) -> Self {
        self.0.events.off(kind, f);
        self.clone()
    }

    pub fn quiet(&self) -> Self {
        {
            let mut inner = self.0.inner.lock().expect("runner lock poisoned");
            inner.options.mirror = false;
        }
        self.start();
        self.clone()
    }

    /// `.kill(signal)` — forwards to a real child's pid or flips the
    /// cancellation token a virtual command's streaming source observes.
    /// Multiple calls coalesce: `CancellationToken::cancel` is itself
    /// idempotent.
    pub fn kill(&self, signal: i32) {
        if let ChildHandle::Real { pid: Some(pid) } = self.child() {
            // SAFETY: pid was obtained from a live tokio::process::Child we
            // spawned; sending a signal to it is exactly what Child::kill
            // does internally for SIGKILL, generalized to arbitrary signals.
            unsafe {
                libc::kill(pid as libc::pid_t, signal);
            }
        }
        self.0.cancel.cancel();
    }

    /// Idempotent: only the first call actually spawns; later calls are
    /// no-ops per §4.5 ("repeated `.start({...})` calls are no-ops").
    pub fn start(&self) -> &Self {
        self.start_with(None)
    }

    pub fn start_with(&self, overrides: Option<RunOptions>) -> &Self {
        if self.0.started.swap(true, Ordering::SeqCst) {
            return self;
        }
        {
            let mut inner = self.0.inner.lock().expect("runner lock poisoned");
            inner.options = inner.options.merged_with(overrides);
            inner.state = RunnerState::Starting;
        }
        // Every runner that actually begins executing is discoverable by
        // the coordinator for signal forwarding, whether or not the host
        // ever calls `Coordinator::install()` — tracking itself is cheap
        // (a weak reference) and self-pruning (see `track`).
        crate::coordinator::Coordinator::track(self);
        let shared = self.0.clone();
        tokio::spawn(async move {
            drive(shared).await;
        });
        self
    }

    /// `.run(opts)` / await-equivalent: ensures started, waits for
    /// completion, returns the one result record by value (cloned — the
    /// "returns the same record by reference" invariant is realized as
    /// every clone being `==` to the original).
    pub async fn run(&self, overrides: Option<RunOptions>) -> RunnerResult {
        self.start_with(overrides);
        loop {
            // Register for the next `notify_waiters()` *before* checking the
            // result: `Notify::notified()` snapshots the notification count
            // at creation time, so a completion that lands between the
            // check and the `.await` below still wakes this future instead
            // of being missed (the race a check-then-`notified()` ordering
            // would have).
            let notified = self.0.done.notified();
            {
                let inner = self.0.inner.lock().expect("runner lock poisoned");
                if let Some(result) = &inner.result {
                    return result.clone();
                }
            }
            notified.await;
        }
    }

    /// Blocking variant (§4.4: "virtual commands must run synchronously;
    /// real processes use blocking spawn"). Safe to call from within an
    /// existing tokio runtime thread because it defers to
    /// `block_in_place`, matching the teacher's `Bash::exec` sync path.
    pub fn sync(&self) -> RunnerResult {
        let this = self.clone();
        tokio::task::block_in_place(move || {
            tokio::runtime::Handle::current().block_on(this.run(None))
        })
    }

    /// Returns a broadcast receiver of `{stdout,stderr}` chunks, starting
    /// the runner on first pull per §4.4.
    pub fn stream(&self) -> tokio::sync::broadcast::Receiver<Chunk> {
        self.start();
        let (tx, rx) = tokio::sync::broadcast::channel(256);
        let mut stdout_rx = self.0.stdout_tx.subscribe();
        let mut stderr_rx = self.0.stderr_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok(data) = stdout_rx.recv() => {
                        if tx.send(Chunk { stream: ChunkStream::Stdout, data }).is_err() { break; }
                    }
                    Ok(data) = stderr_rx.recv() => {
                        if tx.send(Chunk { stream: ChunkStream::Stderr, data }).is_err() { break; }
                    }
                    else => break,
                }
            }
        });
        rx
    }

    pub fn buffers_stdout(&self) -> Option<Vec<u8>> {
        self.finished_result().and_then(|r| r.stdout)
    }

    pub fn buffers_stderr(&self) -> Option<Vec<u8>> {
        self.finished_result().and_then(|r| r.stderr)
    }

    pub fn strings_stdout(&self) -> Option<String> {
        self.buffers_stdout().map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    pub fn strings_stderr(&self) -> Option<String> {
        self.buffers_stderr().map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    /// Overwrites the already-published result — used only by the `sh`/
    /// `cmd!` live-runner path (`crate::interp::Interpreter::eval_str_live`)
    /// to apply redirection/capture post-processing once it's ready,
    /// without making `.on()`/`.stream()` wait for that extra step. A
    /// caller that calls `.run()` in the narrow window between the raw
    /// result landing and this call sees the pre-finalized bytes; file
    /// redirection targets are already written by the time this runs, so
    /// the only visible difference is `result.stdout`/`.stderr` content.
    pub(crate) fn finalize_result(&self, result: RunnerResult) {
        let mut inner = self.0.inner.lock().expect("runner lock poisoned");
        inner.result = Some(result);
        drop(inner);
        self.0.done.notify_waiters();
    }

    fn finished_result(&self) -> Option<RunnerResult> {
        self.0.inner.lock().expect("runner lock poisoned").result.clone()
    }

    /// A non-owning handle, for [`crate::coordinator::Coordinator`] to hold
    /// instead of a strong clone — per spec.md §9's cyclic-reference note,
    /// the Coordinator's live-runner set must not keep an otherwise-dead
    /// runner's buffers and listener table alive.
    pub fn downgrade(&self) -> WeakRunner {
        WeakRunner(Arc::downgrade(&self.0))
    }

    /// Combine this runner's output with `other`'s input, producing a new
    /// runner representing `self | other` (spec.md §4.4's `.pipe(other)`).
    /// Both sides start together and `self`'s stdout is relayed into
    /// `other`'s stdin chunk by chunk as it is produced (`relay_stdout`) —
    /// data flows streaming, not buffered, the same way a shell's own `|`
    /// splices two file descriptors without waiting for the left side to
    /// finish.
    pub fn pipe(&self, other: &Runner) -> Runner {
        let upstream = self.clone();
        let downstream = other.clone();
        let rx = relay_stdout(&upstream, false);
        let relay = Arc::new(tokio::sync::Mutex::new(Some(rx)));

        let target = RunTarget::Virtual {
            cmd: crate::vcmd::VirtualRegistry::with_builtins().lookup("true").expect("true is always registered"),
            args: Vec::new(),
        };
        let placeholder = Runner::new(target, std::env::temp_dir(), Default::default(), RunOptions::default().quiet());
        let shared = placeholder.0.clone();
        tokio::spawn(async move {
            let mut downstream_opts = downstream.0.inner.lock().expect("runner lock poisoned").options.clone();
            downstream_opts.stdin = StdinSource::Relay(relay);
            let (_upstream_result, result) = tokio::join!(upstream.run(None), downstream.run(Some(downstream_opts)));
            let mut inner = shared.inner.lock().expect("runner lock poisoned");
            inner.state = RunnerState::Finished;
            inner.result = Some(result);
            drop(inner);
            shared.done.notify_waiters();
        });
        placeholder.0.started.store(true, Ordering::SeqCst);
        placeholder
    }
}

/// Starts `upstream` (if not already) and relays its stdout — and, when
/// `merge_stderr` is set, its stderr too, interleaved as each arrives —
/// into a bounded channel as bytes are produced, rather than waiting for
/// `upstream` to finish. Used by both [`Runner::pipe`] and
/// `crate::interp::pipeline` to thread one stage's output into the next
/// stage's stdin live.
///
/// If the returned receiver's paired sender side detects the consumer has
/// dropped it before `upstream` finishes (e.g. `head` stopping once it has
/// enough lines via `StdinInput::collect_lines`), `upstream` is killed —
/// the same SIGPIPE-style termination a real shell gives an unbounded
/// producer piped into a consumer that stops reading early.
pub(crate) fn relay_stdout(upstream: &Runner, merge_stderr: bool) -> tokio::sync::mpsc::Receiver<Vec<u8>> {
    upstream.start();
    let mut stdout_rx = upstream.0.stdout_tx.subscribe();
    let mut stderr_rx = upstream.0.stderr_tx.subscribe();
    let (tx, out_rx) = tokio::sync::mpsc::channel(64);
    let upstream = upstream.clone();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            let notified = upstream.0.done.notified();
            if upstream.is_finished() {
                while let Ok(data) = stdout_rx.try_recv() {
                    if tx.send(data).await.is_err() {
                        return;
                    }
                }
                if merge_stderr {
                    while let Ok(data) = stderr_rx.try_recv() {
                        if tx.send(data).await.is_err() {
                            return;
                        }
                    }
                }
                return;
            }
            tokio::select! {
                biased;
                res = stdout_rx.recv() => {
                    match res {
                        Ok(data) => {
                            if tx.send(data).await.is_err() {
                                upstream.kill(libc::SIGTERM);
                                return;
                            }
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => return,
                    }
                }
                res = stderr_rx.recv(), if merge_stderr => {
                    match res {
                        Ok(data) => {
                            if tx.send(data).await.is_err() {
                                upstream.kill(libc::SIGTERM);
                                return;
                            }
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => {}
                    }
                }
                _ = notified => {}
            }
        }
    });
    out_rx
}

/// A non-owning reference to a [`Runner`]'s shared state. Upgrades to a
/// live [`Runner`] only while at least one strong clone is still held
/// elsewhere.
#[derive(Clone)]
pub struct WeakRunner(Weak<RunnerShared>);

impl WeakRunner {
    pub fn upgrade(&self) -> Option<Runner> {
        self.0.upgrade().map(Runner)
    }
}

impl IntoFuture for Runner {
    type Output = RunnerResult;
    type IntoFuture = Pin<Box<dyn Future<Output = RunnerResult> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.run(None).await })
    }
}

async fn drive(shared: Arc<RunnerShared>) {
    {
        let mut inner = shared.inner.lock().expect("runner lock poisoned");
        inner.state = RunnerState::Running;
    }
    let (options, label) = {
        let inner = shared.inner.lock().expect("runner lock poisoned");
        (inner.options.clone(), shared.target.command_label())
    };

    // `timeout`/`cancel` both reduce to the same cancellation token every
    // other kill path already drives (`run_real`'s `shared.cancel.cancelled()`
    // select arm, `run_virtual`'s `ChunkSource::next_chunk` cancellation
    // check) — forwarding here means neither needs its own select arm.
    if let Some(timeout) = options.timeout {
        let cancel = shared.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        });
    }
    if let Some(external) = options.cancel.clone() {
        let cancel = shared.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = external.cancelled() => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        });
    }

    let result = match &shared.target {
        RunTarget::Real { program, args } => run_real(&shared, program, args, &options, &label).await,
        RunTarget::Virtual { cmd, args } => run_virtual(&shared, cmd.clone(), args, &options, &label).await,
    };

    {
        let mut inner = shared.inner.lock().expect("runner lock poisoned");
        inner.state = RunnerState::Finishing;
        inner.result = Some(result.clone());
        inner.child_handle = ChildHandle::Virtual;
        inner.state = RunnerState::Finished;
    }
    shared.events.emit(EventKind::Exit, EventPayload::Exit(result.code));
    shared.events.emit(EventKind::End, EventPayload::End(result));
    shared.done.notify_waiters();
    crate::coordinator::Coordinator::on_runner_finished();
}

async fn run_real(
    shared: &Arc<RunnerShared>,
    program: &str,
    args: &[String],
    options: &RunOptions,
    label: &str,
) -> RunnerResult {
    let mut command = TokioCommand::new(program);
    command.args(args);
    command.current_dir(options.cwd.clone().unwrap_or_else(|| shared.cwd.clone()));
    // Inherit the host environment (tokio's default when `.envs` is never
    // called alongside `env_clear`) plus whatever overrides this shell or
    // call site layered on top — never clear, or bare program names like
    // `echo` stop resolving via `PATH`.
    command.envs(&shared.env);
    if let Some(extra) = &options.env {
        command.envs(extra);
    }
    command.kill_on_drop(true);

    command.stdin(match &options.stdin {
        StdinSource::Inherit => Stdio::inherit(),
        StdinSource::Ignore => Stdio::null(),
        StdinSource::Bytes(_) | StdinSource::Relay(_) => Stdio::piped(),
    });
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    debug!(cmd = %label, "spawning real process");
    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            warn!(cmd = %label, error = %e, "spawn failed");
            shared.events.emit(EventKind::Error, EventPayload::Error(e.to_string()));
            return RunnerResult {
                code: 127,
                failed: true,
                command: label.to_string(),
                ..Default::default()
            };
        }
    };

    let pid = child.id();
    {
        let mut inner = shared.inner.lock().expect("runner lock poisoned");
        inner.child_handle = ChildHandle::Real { pid };
    }
    trace!(cmd = %label, pid = ?pid, "spawned");

    match &options.stdin {
        StdinSource::Bytes(bytes) => {
            if let Some(mut stdin) = child.stdin.take() {
                let bytes = bytes.clone();
                tokio::spawn(async move {
                    let _ = stdin.write_all(&bytes).await;
                });
            }
        }
        StdinSource::Relay(relay) => {
            if let Some(mut stdin) = child.stdin.take() {
                let relay = relay.clone();
                tokio::spawn(async move {
                    let rx = relay.lock().await.take();
                    if let Some(mut rx) = rx {
                        while let Some(chunk) = rx.recv().await {
                            if stdin.write_all(&chunk).await.is_err() {
                                break;
                            }
                        }
                    }
                    // dropping `stdin` here closes the pipe, signaling EOF
                });
            }
        }
        _ => {}
    }

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_task = spawn_relay(shared.clone(), stdout, ChunkStream::Stdout, options.capture, options.mirror);
    let err_task = spawn_relay(shared.clone(), stderr, ChunkStream::Stderr, options.capture, options.mirror);

    let wait_fut = child.wait();
    tokio::pin!(wait_fut);

    let status = tokio::select! {
        status = &mut wait_fut => status,
        _ = shared.cancel.cancelled() => {
            let _ = child.start_kill();
            wait_fut.await
        }
    };
    let _ = out_task.await;
    let _ = err_task.await;

    let (code, signal, killed) = match status {
        Ok(status) => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                if let Some(sig) = status.signal() {
                    (128 + sig, Some(signal_name(sig)), shared.cancel.is_cancelled())
                } else {
                    (status.code().unwrap_or(1), None, shared.cancel.is_cancelled())
                }
            }
            #[cfg(not(unix))]
            {
                (status.code().unwrap_or(1), None, shared.cancel.is_cancelled())
            }
        }
        Err(_) => (1, None, shared.cancel.is_cancelled()),
    };

    let mut result = RunnerResult::finished(label.to_string(), code, signal, killed);
    if options.capture {
        result.stdout = Some(shared.stdout_buf.lock().expect("lock poisoned").clone());
        result.stderr = Some(shared.stderr_buf.lock().expect("lock poisoned").clone());
    }
    result
}

fn spawn_relay<R>(
    shared: Arc<RunnerShared>,
    reader: Option<R>,
    which: ChunkStream,
    capture: bool,
    mirror: bool,
) -> tokio::task::JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut reader) = reader else { return };
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let data = buf[..n].to_vec();
            publish_chunk(&shared, which, data, capture, mirror).await;
        }
    })
}

async fn publish_chunk(shared: &Arc<RunnerShared>, which: ChunkStream, data: Vec<u8>, capture: bool, mirror: bool) {
    if capture {
        let buf = match which {
            ChunkStream::Stdout => &shared.stdout_buf,
            ChunkStream::Stderr => &shared.stderr_buf,
        };
        buf.lock().expect("lock poisoned").extend_from_slice(&data);
    }
    let tx = match which {
        ChunkStream::Stdout => &shared.stdout_tx,
        ChunkStream::Stderr => &shared.stderr_tx,
    };
    let _ = tx.send(data.clone());
    let event = match which {
        ChunkStream::Stdout => EventKind::Stdout,
        ChunkStream::Stderr => EventKind::Stderr,
    };
    shared.events.emit(event, EventPayload::Bytes(data.clone()));
    shared.events.emit(EventKind::Data, EventPayload::Data(Chunk { stream: which, data: data.clone() }));
    if mirror {
        let mut out: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = match which {
            ChunkStream::Stdout => Box::new(tokio::io::stdout()),
            ChunkStream::Stderr => Box::new(tokio::io::stderr()),
        };
        let _ = out.write_all(&data).await;
    }
}

async fn run_virtual(
    shared: &Arc<RunnerShared>,
    cmd: Arc<dyn VirtualCommand>,
    args: &[String],
    options: &RunOptions,
    label: &str,
) -> RunnerResult {
    let stdin = match &options.stdin {
        StdinSource::Bytes(b) => StdinInput::Bytes(b.clone()),
        StdinSource::Relay(relay) => {
            relay.lock().await.take().map(StdinInput::Channel).unwrap_or_else(StdinInput::empty)
        }
        _ => StdinInput::empty(),
    };
    let ctx = CommandContext {
        args: args.to_vec(),
        stdin,
        cwd: options.cwd.clone().unwrap_or_else(|| shared.cwd.clone()),
        env: options.env.clone().unwrap_or_else(|| shared.env.clone()),
    };

    match cmd.execute(ctx).await {
        CommandOutcome::Buffered(r) => {
            if options.capture {
                publish_chunk(shared, ChunkStream::Stdout, r.stdout.clone(), true, options.mirror).await;
                publish_chunk(shared, ChunkStream::Stderr, r.stderr.clone(), true, options.mirror).await;
            } else if options.mirror {
                publish_chunk(shared, ChunkStream::Stdout, r.stdout.clone(), false, true).await;
                publish_chunk(shared, ChunkStream::Stderr, r.stderr.clone(), false, true).await;
            }
            let mut result = RunnerResult::finished(label.to_string(), r.exit_code, None, false);
            result.cwd_override = r.cwd_override;
            if options.capture {
                result.stdout = Some(r.stdout);
                result.stderr = Some(r.stderr);
            }
            result
        }
        CommandOutcome::Streaming(mut source) => {
            loop {
                match source.next_chunk(&shared.cancel).await {
                    Some(chunk) => publish_chunk(shared, ChunkStream::Stdout, chunk, options.capture, options.mirror).await,
                    None => break,
                }
            }
            let killed = shared.cancel.is_cancelled();
            let code = if killed { 143 } else { 0 };
            let mut result = RunnerResult::finished(label.to_string(), code, killed.then(|| "SIGTERM".to_string()), killed);
            if options.capture {
                result.stdout = Some(shared.stdout_buf.lock().expect("lock poisoned").clone());
                result.stderr = Some(shared.stderr_buf.lock().expect("lock poisoned").clone());
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn opts() -> RunOptions {
        RunOptions::default()
    }

    #[tokio::test]
    async fn real_echo_captures_stdout() {
        let target = RunTarget::Real { program: "echo".to_string(), args: vec!["hi".to_string()] };
        let runner = Runner::new(target, PathBuf::from("."), HashMap::new(), opts());
        let result = runner.run(None).await;
        assert_eq!(result.code, 0);
        assert_eq!(result.text(), "hi\n");
    }

    #[tokio::test]
    async fn multiple_awaiters_see_the_same_result() {
        let target = RunTarget::Real { program: "true".to_string(), args: vec![] };
        let runner = Runner::new(target, PathBuf::from("."), HashMap::new(), opts());
        let a = runner.clone();
        let b = runner.clone();
        let (ra, rb) = tokio::join!(a.run(None), b.run(None));
        assert_eq!(ra.code, rb.code);
    }

    #[tokio::test]
    async fn nonexistent_program_yields_spawn_failure_code() {
        let target = RunTarget::Real { program: "definitely-not-a-real-binary".to_string(), args: vec![] };
        let runner = Runner::new(target, PathBuf::from("."), HashMap::new(), opts());
        let result = runner.run(None).await;
        assert_eq!(result.code, 127);
        assert!(result.failed);
    }

    #[tokio::test]
    async fn virtual_true_runs_synchronously_to_completion() {
        let cmd = crate::vcmd::VirtualRegistry::with_builtins().lookup("true").expect("true registered");
        let target = RunTarget::Virtual { cmd, args: vec![] };
        let runner = Runner::new(target, PathBuf::from("."), HashMap::new(), opts());
        let result = runner.run(None).await;
        assert_eq!(result.code, 0);
    }

    #[tokio::test]
    async fn into_future_allows_plain_await() {
        let target = RunTarget::Real { program: "true".to_string(), args: vec![] };
        let runner = Runner::new(target, PathBuf::from("."), HashMap::new(), opts());
        let result = runner.await;
        assert_eq!(result.code, 0);
    }

    #[tokio::test]
    async fn pipe_threads_upstream_stdout_into_downstream_stdin() {
        let upstream = Runner::new(
            RunTarget::Real { program: "echo".to_string(), args: vec!["hello".to_string()] },
            PathBuf::from("."),
            HashMap::new(),
            opts(),
        );
        let mut downstream_opts = opts();
        downstream_opts.stdin = StdinSource::Bytes(Vec::new());
        let downstream = Runner::new(
            RunTarget::Real { program: "cat".to_string(), args: vec![] },
            PathBuf::from("."),
            HashMap::new(),
            downstream_opts,
        );
        let piped = upstream.pipe(&downstream);
        let result = piped.run(None).await;
        assert_eq!(result.text(), "hello\n");
    }
}
