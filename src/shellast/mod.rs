//! Pipeline AST (C2 data model).
//!
//! Generalizes the teacher's `ast::types` tree (`ScriptNode` /
//! `PipelineNode` / `SimpleCommandNode` / `RedirectionNode`) down to the
//! reduced grammar spec.md §3/§6 describes: sequences, conditionals,
//! pipes, subshells, and redirections. Bash control-flow nodes (`if`,
//! `for`, `while`, functions, arithmetic) have no counterpart here — a
//! command string containing them is classified [`ShellNode::Raw`] and
//! handed to a real shell instead (see `shparser`).

/// One word of a command (already assembled by the caller; this crate's
/// scope does not include further bash-style parameter expansion of
/// `$VAR`/`${VAR}` inside a parsed word — spec.md §6 routes those to the
/// real-shell fallback).
pub type Word = String;

/// A single external-or-virtual command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub program: Word,
    pub args: Vec<Word>,
    pub redirections: Vec<RedirectionNode>,
}

/// `a | b | c`
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineNode {
    pub stages: Vec<CommandNode>,
    /// `|&` — merge each stage's stderr into the pipe as well as stdout.
    pub merge_stderr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOp {
    And,  // &&
    Or,   // ||
    Semi, // ;
}

/// An ordered list of pipelines joined by `;`, `&&`, or `||`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceNode {
    pub first: ShellNode,
    /// `(operator, next_node)` pairs, left to right.
    pub rest: Vec<(SequenceOp, ShellNode)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Stdout,
    Stderr,
    Both, // &> — stdout and stderr to the same file
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedirectKind {
    /// `> file` (truncate) or `>> file` (append)
    ToFile { path: String, append: bool, target: RedirectTarget },
    /// `< file`
    FromFile { path: String },
    /// `<<TAG ... TAG` — heredoc body, already collected by the parser.
    Heredoc { body: String },
    /// `<<<word` — here-string.
    HereString { content: String },
    /// `2>&1` — duplicate stderr onto stdout.
    DupStderrToStdout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedirectionNode {
    pub kind: RedirectKind,
}

/// Root node produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellNode {
    Command(Box<CommandNode>),
    Pipeline(Box<PipelineNode>),
    Sequence(Box<SequenceNode>),
    /// `( ... )` — isolated cwd/env; code is the inner sequence's code.
    Subshell(Box<ShellNode>),
    /// The parser recognized syntax it does not reimplement (heredocs with
    /// expansion, compound commands, process substitution, arrays,
    /// functions, arithmetic, brace expansion) and is handing the whole
    /// original string to `/bin/sh -c`.
    Raw(String),
}

impl ShellNode {
    pub fn command(program: impl Into<String>, args: Vec<String>) -> Self {
        ShellNode::Command(Box::new(CommandNode {
            program: program.into(),
            args,
            redirections: Vec::new(),
        }))
    }
}
