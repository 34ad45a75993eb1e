//! Result record (§3/§4.4's "Result record").

/// What a [`super::Runner`] resolves to, exactly once. `exit_code()` is an
/// accessor, not a duplicate field — the JS spec's `code`/`exitCode` pair
/// becomes one field plus a method so the two representations of the same
/// number can never drift apart in the Rust encoding.
#[derive(Debug, Clone, Default)]
pub struct RunnerResult {
    pub code: i32,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
    pub stdin: Option<Vec<u8>>,
    pub signal: Option<String>,
    pub failed: bool,
    pub killed: bool,
    pub command: String,
    /// Set only by the virtual `cd` built-in: the logical working directory
    /// the interpreter should thread into the rest of its sequence. Real
    /// processes never set this — an OS process cannot change its parent's
    /// cwd.
    pub cwd_override: Option<std::path::PathBuf>,
}

impl RunnerResult {
    pub fn exit_code(&self) -> i32 {
        self.code
    }

    /// `stdout` decoded lossily as UTF-8, or empty if capture was disabled.
    pub fn text(&self) -> String {
        self.stdout
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn finished(command: String, code: i32, signal: Option<String>, killed: bool) -> Self {
        Self {
            code,
            failed: code != 0 || signal.is_some(),
            killed,
            signal,
            command,
            ..Default::default()
        }
    }
}

/// Translate a Unix signal number into the `128 + n` exit-code convention
/// spec.md §3 specifies, and a human-readable signal name.
pub(crate) fn signal_name(num: i32) -> String {
    match num {
        libc::SIGINT => "SIGINT".to_string(),
        libc::SIGTERM => "SIGTERM".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        libc::SIGHUP => "SIGHUP".to_string(),
        libc::SIGQUIT => "SIGQUIT".to_string(),
        other => format!("SIG{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reflects_code_or_signal() {
        let r = RunnerResult::finished("echo".into(), 0, None, false);
        assert!(!r.failed);
        let r = RunnerResult::finished("echo".into(), 1, None, false);
        assert!(r.failed);
        let r = RunnerResult::finished("echo".into(), 0, Some("SIGTERM".into()), false);
        assert!(r.failed);
    }

    #[test]
    fn text_is_empty_without_capture() {
        let r = RunnerResult::default();
        assert_eq!(r.text(), "");
    }
}
