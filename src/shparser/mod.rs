//! Command-string parser (C2).
//!
//! Turns a template-interpolated command string into a [`crate::shellast::ShellNode`]
//! using a small recursive-descent parser over [`lexer::Lexer`]'s token stream,
//! the same two-stage shape as the teacher's `parser::lexer` + `parser::parser`
//! pair, scoped down to the grammar spec.md §4.2/§6 actually needs: sequences,
//! `&&`/`||`, pipelines (`|`, `|&`), subshells, and redirections. Anything else
//! is classified [`crate::shellast::ShellNode::Raw`] rather than rejected.

pub mod lexer;

use crate::error::ParseError;
use crate::shellast::{
    CommandNode, PipelineNode, RedirectKind, RedirectTarget, RedirectionNode, SequenceNode,
    SequenceOp, ShellNode,
};
use lexer::{has_needs_real_shell_syntax, Lexer, Token, TokenKind};

/// Parse a full command string into a [`ShellNode`].
///
/// Never fails on syntax this parser doesn't understand — that case is
/// represented as `Ok(ShellNode::Raw(src.to_string()))`, not an error.
/// [`ParseError`] is reserved for malformed input within the subset this
/// parser *does* own (unbalanced quotes, a dangling operator, unmatched
/// parens).
pub fn parse(src: &str) -> Result<ShellNode, ParseError> {
    if has_needs_real_shell_syntax(src) {
        return Ok(ShellNode::Raw(src.to_string()));
    }
    let tokens = match Lexer::new(src).tokenize() {
        Ok(t) => t,
        Err(e) => return Err(ParseError::new(e.message, e.pos)),
    };
    let mut p = Parser { tokens, pos: 0, src };
    let node = p.parse_sequence()?;
    p.expect_eof()?;
    Ok(node)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.peek_kind() == TokenKind::Eof {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("unexpected token `{}`", self.peek().text),
                self.peek().pos,
            ))
        }
    }

    /// sequence := pipeline ( (`&&`|`||`|`;`) pipeline )*
    fn parse_sequence(&mut self) -> Result<ShellNode, ParseError> {
        let first = self.parse_pipeline()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::AndAnd => SequenceOp::And,
                TokenKind::OrOr => SequenceOp::Or,
                TokenKind::Semi => SequenceOp::Semi,
                _ => break,
            };
            self.bump();
            // Trailing `;` with nothing after it is legal and simply ends
            // the sequence (mirrors bash's terminator semantics).
            if op == SequenceOp::Semi
                && matches!(self.peek_kind(), TokenKind::Eof | TokenKind::RParen)
            {
                break;
            }
            let next = self.parse_pipeline()?;
            rest.push((op, next));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(ShellNode::Sequence(Box::new(SequenceNode { first, rest })))
        }
    }

    /// pipeline := unit ( (`|`|`|&`) unit )*
    fn parse_pipeline(&mut self) -> Result<ShellNode, ParseError> {
        let first = self.parse_unit()?;
        if !matches!(self.peek_kind(), TokenKind::Pipe | TokenKind::PipeAmp) {
            return Ok(first);
        }
        let mut stages = vec![self.expect_command_node(first)?];
        let mut merge_stderr = false;
        while matches!(self.peek_kind(), TokenKind::Pipe | TokenKind::PipeAmp) {
            if self.bump().kind == TokenKind::PipeAmp {
                merge_stderr = true;
            }
            let next = self.parse_unit()?;
            stages.push(self.expect_command_node(next)?);
        }
        Ok(ShellNode::Pipeline(Box::new(PipelineNode { stages, merge_stderr })))
    }

    fn expect_command_node(&self, node: ShellNode) -> Result<CommandNode, ParseError> {
        match node {
            ShellNode::Command(c) => Ok(*c),
            other => Err(ParseError::new(
                format!("pipeline stage must be a simple command, found {other:?}"),
                self.peek().pos,
            )),
        }
    }

    /// unit := `(` sequence `)` | command
    fn parse_unit(&mut self) -> Result<ShellNode, ParseError> {
        if self.peek_kind() == TokenKind::LParen {
            self.bump();
            let inner = self.parse_sequence()?;
            if self.peek_kind() != TokenKind::RParen {
                return Err(ParseError::new("expected `)`", self.peek().pos));
            }
            self.bump();
            return Ok(ShellNode::Subshell(Box::new(inner)));
        }
        self.parse_command()
    }

    /// command := word+ redirection* , where redirections may be interspersed
    fn parse_command(&mut self) -> Result<ShellNode, ParseError> {
        let mut words = Vec::new();
        let mut redirections = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Word => {
                    words.push(self.bump().text);
                }
                TokenKind::Less => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode { kind: RedirectKind::FromFile { path } });
                }
                TokenKind::DLessLess => {
                    self.bump();
                    let content = self.expect_word("here-string content")?;
                    redirections
                        .push(RedirectionNode { kind: RedirectKind::HereString { content } });
                }
                TokenKind::DLess => {
                    self.bump();
                    // Heredoc bodies require reading source lines after a
                    // terminator tag, which this single-line-oriented lexer
                    // does not model — defer to the real-shell fallback.
                    return Ok(ShellNode::Raw(self.src.to_string()));
                }
                TokenKind::Great => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode {
                        kind: RedirectKind::ToFile { path, append: false, target: RedirectTarget::Stdout },
                    });
                }
                TokenKind::DGreat => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode {
                        kind: RedirectKind::ToFile { path, append: true, target: RedirectTarget::Stdout },
                    });
                }
                TokenKind::ErrGreat => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode {
                        kind: RedirectKind::ToFile { path, append: false, target: RedirectTarget::Stderr },
                    });
                }
                TokenKind::ErrDGreat => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode {
                        kind: RedirectKind::ToFile { path, append: true, target: RedirectTarget::Stderr },
                    });
                }
                TokenKind::AndGreat => {
                    self.bump();
                    let path = self.expect_word("redirection target")?;
                    redirections.push(RedirectionNode {
                        kind: RedirectKind::ToFile { path, append: false, target: RedirectTarget::Both },
                    });
                }
                TokenKind::DupErrOut => {
                    self.bump();
                    redirections.push(RedirectionNode { kind: RedirectKind::DupStderrToStdout });
                }
                _ => break,
            }
        }
        if words.is_empty() {
            return Err(ParseError::new(
                format!("expected a command, found `{}`", self.peek().text),
                self.peek().pos,
            ));
        }
        let program = words.remove(0);
        Ok(ShellNode::Command(Box::new(CommandNode { program, args: words, redirections })))
    }

    fn expect_word(&mut self, what: &str) -> Result<String, ParseError> {
        if self.peek_kind() == TokenKind::Word {
            Ok(self.bump().text)
        } else {
            Err(ParseError::new(format!("expected {what}"), self.peek().pos))
        }
    }
}
