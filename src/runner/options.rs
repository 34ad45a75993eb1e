//! Options record (§4.5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

/// Source for a child's stdin, mirroring the JS spec's
/// `'inherit'/'ignore'/string/bytes/readable stream` union as an enum —
/// Rust has no single type that is sometimes a string and sometimes a
/// stream, so each case gets its own variant.
///
/// `Relay` is the pipeline/`.pipe()` case: the previous stage is still
/// running and feeds this stage's stdin incrementally through a channel
/// (see `crate::runner::relay_stdout`) instead of a pre-materialized
/// buffer. Wrapped in `Arc<AsyncMutex<Option<_>>>` so `StdinSource` stays
/// `Clone` even though `mpsc::Receiver` is not — there is exactly one
/// consumer, which takes the receiver out on first use.
#[derive(Clone, Default)]
pub enum StdinSource {
    #[default]
    Inherit,
    Ignore,
    Bytes(Vec<u8>),
    Relay(Arc<AsyncMutex<Option<tokio::sync::mpsc::Receiver<Vec<u8>>>>>),
}

impl StdinSource {
    pub fn text(s: impl Into<String>) -> Self {
        StdinSource::Bytes(s.into().into_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Async,
    Sync,
}

#[derive(Clone)]
pub struct RunOptions {
    pub capture: bool,
    pub mirror: bool,
    pub stdin: StdinSource,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    pub mode: RunMode,
    pub interactive: bool,
    pub cancel: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture: true,
            mirror: true,
            stdin: StdinSource::default(),
            cwd: None,
            env: None,
            mode: RunMode::default(),
            interactive: false,
            cancel: None,
            timeout: None,
        }
    }
}

impl RunOptions {
    pub fn quiet(mut self) -> Self {
        self.mirror = false;
        self
    }

    /// Merge `overrides` over `self`, the "options passed to `.start()` merge
    /// over construction-time options on first call only" rule from §4.5 —
    /// `self` is the construction-time baseline, `overrides` is what arrived
    /// at `.start(opts)`.
    pub(crate) fn merged_with(&self, overrides: Option<RunOptions>) -> RunOptions {
        match overrides {
            None => self.clone(),
            Some(o) => o,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_capture_and_mirror_true() {
        let o = RunOptions::default();
        assert!(o.capture);
        assert!(o.mirror);
    }

    #[test]
    fn quiet_disables_mirror_only() {
        let o = RunOptions::default().quiet();
        assert!(!o.mirror);
        assert!(o.capture);
    }
}
