//! Lexer for the reduced command-string grammar (C2).
//!
//! Tokenizes respecting single-quoted (no escapes inside) and
//! double-quoted (backslash escapes `\"`, `\\`, `\$`, `` \` ``) spans,
//! recognizing metacharacters only outside quotes — exactly spec.md
//! §4.2's contract. Structured as a standalone pass the way the teacher's
//! `parser::lexer` produces a `Vec<Token>` for `parser::parser` to walk.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Pipe,      // |
    PipeAmp,   // |&
    AndAnd,    // &&
    OrOr,      // ||
    Semi,      // ;
    LParen,    // (
    RParen,    // )
    Less,      // <
    Great,     // >
    DGreat,    // >>
    DLess,     // <<
    DLessLess, // <<<
    AndGreat,  // &>
    DupErrOut, // 2>&1
    ErrGreat,  // 2>
    ErrDGreat, // 2>>
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

/// Syntax the parser does not reimplement — its presence classifies the
/// whole command string as [`crate::shellast::ShellNode::Raw`].
pub fn has_needs_real_shell_syntax(src: &str) -> bool {
    let keywords = ["if ", "for ", "while ", "case ", "function ", "until "];
    let trimmed = src.trim_start();
    if keywords.iter().any(|k| trimmed.starts_with(k)) {
        return true;
    }
    if src.contains("<(") || src.contains(">(") {
        return true;
    }
    if src.contains("$((") {
        return true;
    }
    // Brace expansion: `{a,b}` or `{1..3}` outside of quotes.
    if contains_unquoted_brace_expansion(src) {
        return true;
    }
    false
}

fn contains_unquoted_brace_expansion(src: &str) -> bool {
    let mut in_single = false;
    let mut in_double = false;
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => {
                // Look for a comma or `..` before the matching `}`.
                let mut depth = 1;
                let mut j = i + 1;
                let mut has_marker = false;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        ',' if depth == 1 => has_marker = true,
                        '.' if depth == 1 && chars.get(j + 1) == Some(&'.') => has_marker = true,
                        _ => {}
                    }
                    j += 1;
                }
                if has_marker && depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

pub struct Lexer {
    src: Vec<char>,
    pos: usize,
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub pos: usize,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self { src: src.chars().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            match self.peek() {
                None => {
                    tokens.push(Token { kind: TokenKind::Eof, text: String::new(), pos: start });
                    break;
                }
                Some('|') => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        tokens.push(tok(TokenKind::OrOr, "||", start));
                    } else if self.peek() == Some('&') {
                        self.bump();
                        tokens.push(tok(TokenKind::PipeAmp, "|&", start));
                    } else {
                        tokens.push(tok(TokenKind::Pipe, "|", start));
                    }
                }
                Some('&') => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        tokens.push(tok(TokenKind::AndAnd, "&&", start));
                    } else if self.peek() == Some('>') {
                        self.bump();
                        tokens.push(tok(TokenKind::AndGreat, "&>", start));
                    } else {
                        return Err(LexError { message: "unsupported background operator '&'".into(), pos: start });
                    }
                }
                Some(';') => {
                    self.bump();
                    tokens.push(tok(TokenKind::Semi, ";", start));
                }
                Some('(') => {
                    self.bump();
                    tokens.push(tok(TokenKind::LParen, "(", start));
                }
                Some(')') => {
                    self.bump();
                    tokens.push(tok(TokenKind::RParen, ")", start));
                }
                Some('<') => {
                    self.bump();
                    if self.peek() == Some('<') && self.peek_at(1) == Some('<') {
                        self.bump();
                        self.bump();
                        tokens.push(tok(TokenKind::DLessLess, "<<<", start));
                    } else if self.peek() == Some('<') {
                        self.bump();
                        tokens.push(tok(TokenKind::DLess, "<<", start));
                    } else {
                        tokens.push(tok(TokenKind::Less, "<", start));
                    }
                }
                Some('>') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        tokens.push(tok(TokenKind::DGreat, ">>", start));
                    } else {
                        tokens.push(tok(TokenKind::Great, ">", start));
                    }
                }
                Some('2') if self.peek_at(1) == Some('>') => {
                    self.bump();
                    self.bump();
                    if self.peek() == Some('&') && self.peek_at(1) == Some('1') {
                        self.bump();
                        self.bump();
                        tokens.push(tok(TokenKind::DupErrOut, "2>&1", start));
                    } else if self.peek() == Some('>') {
                        self.bump();
                        tokens.push(tok(TokenKind::ErrDGreat, "2>>", start));
                    } else {
                        tokens.push(tok(TokenKind::ErrGreat, "2>", start));
                    }
                }
                Some(_) => {
                    let word = self.read_word()?;
                    tokens.push(tok(TokenKind::Word, &word, start));
                }
            }
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
            self.bump();
        }
    }

    fn is_metachar(c: char) -> bool {
        matches!(c, '|' | '&' | ';' | '(' | ')' | '<' | '>' | ' ' | '\t' | '\n' | '\r')
    }

    /// Read a single word, respecting single/double quoting. Concatenates
    /// adjacent quoted/unquoted spans the way bash does (`a'b'"c"` is one
    /// word: `abc`).
    fn read_word(&mut self) -> Result<String, LexError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => break,
                Some('\'') => {
                    self.bump();
                    let start = self.pos;
                    loop {
                        match self.bump() {
                            Some('\'') => break,
                            Some(c) => out.push(c),
                            None => {
                                return Err(LexError {
                                    message: "unterminated single-quoted string".into(),
                                    pos: start,
                                })
                            }
                        }
                    }
                }
                Some('"') => {
                    self.bump();
                    let start = self.pos;
                    loop {
                        match self.bump() {
                            Some('"') => break,
                            Some('\\') => match self.bump() {
                                Some(c @ ('"' | '\\' | '$' | '`')) => out.push(c),
                                Some(c) => {
                                    out.push('\\');
                                    out.push(c);
                                }
                                None => {
                                    return Err(LexError {
                                        message: "unterminated double-quoted string".into(),
                                        pos: start,
                                    })
                                }
                            },
                            Some(c) => out.push(c),
                            None => {
                                return Err(LexError {
                                    message: "unterminated double-quoted string".into(),
                                    pos: start,
                                })
                            }
                        }
                    }
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(c) => out.push(c),
                        None => out.push('\\'),
                    }
                }
                Some(c) if Self::is_metachar(c) => break,
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
        Ok(out)
    }
}

fn tok(kind: TokenKind, text: &str, pos: usize) -> Token {
    Token { kind, text: text.to_string(), pos }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_word() {
        let toks = Lexer::new("echo hello").tokenize().unwrap();
        assert_eq!(toks[0].text, "echo");
        assert_eq!(toks[1].text, "hello");
    }

    #[test]
    fn pipe_and_and_or() {
        assert_eq!(kinds("a | b"), vec![TokenKind::Word, TokenKind::Pipe, TokenKind::Word, TokenKind::Eof]);
        assert_eq!(kinds("a && b"), vec![TokenKind::Word, TokenKind::AndAnd, TokenKind::Word, TokenKind::Eof]);
        assert_eq!(kinds("a || b"), vec![TokenKind::Word, TokenKind::OrOr, TokenKind::Word, TokenKind::Eof]);
    }

    #[test]
    fn quoted_word_concatenation() {
        let toks = Lexer::new(r#"a'b'"c""#).tokenize().unwrap();
        assert_eq!(toks[0].text, "abc");
    }

    #[test]
    fn double_quote_escapes() {
        let toks = Lexer::new(r#""a\"b\\c\$d""#).tokenize().unwrap();
        assert_eq!(toks[0].text, "a\"b\\c$d");
    }

    #[test]
    fn single_quote_has_no_escapes() {
        let toks = Lexer::new(r#"'a\nb'"#).tokenize().unwrap();
        assert_eq!(toks[0].text, "a\\nb");
    }

    #[test]
    fn unterminated_single_quote_errors() {
        assert!(Lexer::new("'abc").tokenize().is_err());
    }

    #[test]
    fn redirections() {
        assert_eq!(kinds("a > b"), vec![TokenKind::Word, TokenKind::Great, TokenKind::Word, TokenKind::Eof]);
        assert_eq!(kinds("a >> b"), vec![TokenKind::Word, TokenKind::DGreat, TokenKind::Word, TokenKind::Eof]);
        assert_eq!(kinds("a 2>&1"), vec![TokenKind::Word, TokenKind::DupErrOut, TokenKind::Eof]);
    }

    #[test]
    fn detects_needs_real_shell() {
        assert!(has_needs_real_shell_syntax("if true; then echo hi; fi"));
        assert!(has_needs_real_shell_syntax("for i in a b; do echo $i; done"));
        assert!(has_needs_real_shell_syntax("echo <(cat file)"));
        assert!(has_needs_real_shell_syntax("echo {a,b}"));
        assert!(!has_needs_real_shell_syntax("echo 'a {not a brace}'"));
        assert!(!has_needs_real_shell_syntax("echo hello | grep h"));
    }
}
