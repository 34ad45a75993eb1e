//! Signal & cleanup coordinator (C7).
//!
//! Forwards host `SIGINT`/`SIGTERM` to every live [`Runner`] and ensures
//! spawned children don't outlive the process. Grounded on the daemon's
//! own signal loop (`tokio::signal::unix::{signal, SignalKind}`,
//! `main.rs`'s `sigterm.recv()`/`sigint.recv()` select arms), generalized
//! from "shut this one daemon down" to "forward this signal to every
//! registered child" — the shell-library equivalent of a process group.

use std::sync::{Mutex, OnceLock};

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::runner::{Runner, WeakRunner};

struct CoordinatorInner {
    // Non-owning: the Coordinator observes live runners, it does not keep
    // them alive. Storing a strong `Runner` here would mean a runner
    // nobody else references anymore still lingers (buffers, listener
    // table) until an explicit `reap()` — spec.md §9 flags exactly this
    // Runner<->Coordinator cycle risk and prescribes an arena id or weak
    // reference instead.
    runners: Vec<WeakRunner>,
    // The signal-forwarding task, present only while the live set is
    // non-empty — installed the moment it stops being empty, aborted the
    // moment it goes back to empty, so an embedder with no running
    // commands has no background listener at all.
    task: Option<tokio::task::JoinHandle<()>>,
}

/// Process-wide singleton. A single shared `SIGINT`/`SIGTERM` hook is
/// installed the moment the tracked-runner set becomes non-empty and torn
/// down the moment it goes back to empty — an embedding host never calls
/// [`Coordinator::install`] itself, tracking a runner is enough.
pub struct Coordinator {
    inner: Mutex<CoordinatorInner>,
}

static COORDINATOR: OnceLock<Coordinator> = OnceLock::new();

impl Coordinator {
    fn get_or_init() -> &'static Coordinator {
        COORDINATOR.get_or_init(|| Coordinator { inner: Mutex::new(CoordinatorInner { runners: Vec::new(), task: None }) })
    }

    /// Register a runner so a future host `SIGINT`/`SIGTERM` reaches it.
    /// Called by [`crate::runner::Runner::start_with`] for every runner
    /// that actually begins executing, so callers never need to touch
    /// this directly. Installs the signal listener automatically the
    /// moment the tracked set stops being empty.
    pub fn track(runner: &Runner) {
        let coordinator = Self::get_or_init();
        let mut inner = coordinator.inner.lock().expect("coordinator lock poisoned");
        // Opportunistic prune on every insert: since nothing else forces a
        // `reap()` call for an embedder that never calls it directly, the
        // tracking set would otherwise grow without bound across a
        // long-lived process that runs many short commands.
        inner.runners.retain(|weak| matches!(weak.upgrade(), Some(r) if !r.is_finished()));
        let was_empty = inner.runners.is_empty();
        inner.runners.push(runner.downgrade());
        if was_empty {
            Self::install_locked(&mut inner);
        }
    }

    /// Spawn the background task that listens for `SIGINT`/`SIGTERM` and
    /// forwards them to every tracked runner, if it is not already
    /// running. Normally callers never need this directly — `track` calls
    /// it automatically — but it is exposed for a host that wants the
    /// listener up before any runner starts.
    pub fn install() {
        let coordinator = Self::get_or_init();
        let mut inner = coordinator.inner.lock().expect("coordinator lock poisoned");
        Self::install_locked(&mut inner);
    }

    fn install_locked(inner: &mut CoordinatorInner) {
        if inner.task.is_some() {
            return;
        }
        inner.task = Some(tokio::spawn(async move {
            let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
                warn!("failed to install SIGTERM handler");
                return;
            };
            let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
                warn!("failed to install SIGINT handler");
                return;
            };
            loop {
                let sig = tokio::select! {
                    _ = sigterm.recv() => libc::SIGTERM,
                    _ = sigint.recv() => libc::SIGINT,
                };
                info!(signal = sig, "forwarding signal to tracked runners");
                Self::forward(sig);
            }
        }));
    }

    fn forward(signal: i32) {
        let coordinator = Self::get_or_init();
        let weak_runners: Vec<WeakRunner> = {
            let inner = coordinator.inner.lock().expect("coordinator lock poisoned");
            inner.runners.clone()
        };
        for weak in weak_runners {
            if let Some(runner) = weak.upgrade() {
                runner.kill(signal);
            }
        }
    }

    /// Drop every finished or already-dropped runner from the tracking set
    /// so it doesn't grow unbounded across a long-lived embedding process,
    /// tearing down the signal listener if that leaves the set empty.
    pub fn reap() {
        let coordinator = Self::get_or_init();
        let mut inner = coordinator.inner.lock().expect("coordinator lock poisoned");
        Self::prune_locked(&mut inner);
    }

    /// Called when a tracked runner finishes, so the set (and, in turn,
    /// the signal listener) doesn't wait for the next `track`/`reap` call
    /// to notice the live set has drained to nothing.
    pub(crate) fn on_runner_finished() {
        let coordinator = Self::get_or_init();
        let mut inner = coordinator.inner.lock().expect("coordinator lock poisoned");
        Self::prune_locked(&mut inner);
    }

    fn prune_locked(inner: &mut CoordinatorInner) {
        inner.runners.retain(|weak| matches!(weak.upgrade(), Some(r) if !r.is_finished()));
        if inner.runners.is_empty() {
            if let Some(task) = inner.task.take() {
                task.abort();
            }
        }
    }

    pub fn tracked_count() -> usize {
        let coordinator = Self::get_or_init();
        coordinator.inner.lock().expect("coordinator lock poisoned").runners.len()
    }
}
