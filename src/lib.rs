//! shellstream — embeddable shell-style command execution with virtual
//! commands, pipelines, and streaming.
//!
//! Template commands are parsed into a small pipeline AST, each stage
//! dispatches to either a real OS process or a registered virtual
//! command, and every invocation resolves through one uniform
//! deferred/awaitable/streamable [`runner::Runner`] handle.

pub mod coordinator;
pub mod entry;
pub mod error;
pub mod execa_compat;
pub mod interp;
pub mod quote;
pub mod runner;
pub mod settings;
pub mod shellast;
pub mod shparser;
pub mod vcmd;

// `cmd!` is `#[macro_export]`ed from `entry` directly to crate root —
// usable as `shellstream::cmd!(...)` with no re-export needed here.
pub use entry::{create, exec, sh, Shell};
pub use error::{ParseError, ShellError};
pub use quote::{quote, raw, QuoteValue};
pub use runner::{RunOptions, RunTarget, Runner, RunnerResult, StdinSource};
