//! Shell-settings scope (C8).
//!
//! A single process-wide record of bash-style toggles, consulted by the
//! interpreter for operator semantics and by the runner for
//! error-throwing behavior. Naming follows the teacher's
//! `interpreter::types::ShellOptions` and the option letters its
//! `interpreter::helpers::shellopts` module recognizes.

use std::sync::{Arc, RwLock};

/// `errexit` / `pipefail` / `nounset` / `verbose` / `xtrace`, as spec.md §3
/// describes them. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellSettings {
    pub errexit: bool,
    pub pipefail: bool,
    pub nounset: bool,
    pub verbose: bool,
    pub xtrace: bool,
}

/// One of the bash-style `set`/`unset` option names or letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOption {
    Errexit,
    Verbose,
    Xtrace,
    Pipefail,
    Nounset,
}

impl SetOption {
    /// Parse a `set -o name` word or a short `set -e` letter.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "e" | "errexit" => Some(Self::Errexit),
            "v" | "verbose" => Some(Self::Verbose),
            "x" | "xtrace" => Some(Self::Xtrace),
            "pipefail" => Some(Self::Pipefail),
            "u" | "nounset" => Some(Self::Nounset),
            _ => None,
        }
    }
}

/// Shared handle to the process-wide settings record.
///
/// A plain `std::sync::RwLock` is enough here: updates are rare (a user
/// calling `set`/`unset`) and reads are cheap `Copy` snapshots, so there is
/// no need for `parking_lot` (used elsewhere in the reference pack for
/// hotter paths) or a thread-local (which would fragment the one
/// process-wide record spec.md §3 describes across tokio worker threads).
#[derive(Clone)]
pub struct SettingsHandle(Arc<RwLock<ShellSettings>>);

impl SettingsHandle {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(ShellSettings::default())))
    }

    pub fn snapshot(&self) -> ShellSettings {
        *self.0.read().expect("settings lock poisoned")
    }

    pub fn set(&self, opt: SetOption) {
        let mut guard = self.0.write().expect("settings lock poisoned");
        match opt {
            SetOption::Errexit => guard.errexit = true,
            SetOption::Verbose => guard.verbose = true,
            SetOption::Xtrace => guard.xtrace = true,
            SetOption::Pipefail => guard.pipefail = true,
            SetOption::Nounset => guard.nounset = true,
        }
    }

    pub fn unset(&self, opt: SetOption) {
        let mut guard = self.0.write().expect("settings lock poisoned");
        match opt {
            SetOption::Errexit => guard.errexit = false,
            SetOption::Verbose => guard.verbose = false,
            SetOption::Xtrace => guard.xtrace = false,
            SetOption::Pipefail => guard.pipefail = false,
            SetOption::Nounset => guard.nounset = false,
        }
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new()
    }
}
