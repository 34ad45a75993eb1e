//! Argument Quoter (C1).
//!
//! A single pure, total function: given an interpolated value and the
//! characters immediately flanking its placeholder in the surrounding
//! template, produce a shell-safe fragment. No parsing, no I/O, no
//! failure mode — exactly spec.md §4.1's contract.

/// A value that can be interpolated into a command template via [`quote`].
///
/// Mirrors the small set of shapes spec.md §3 distinguishes: scalars,
/// ordered sequences (joined with a single space, each element quoted),
/// and `raw` values that bypass quoting entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteValue {
    Null,
    Bool(bool),
    Number(String),
    Str(String),
    List(Vec<QuoteValue>),
    /// Produced by [`crate::raw`]; inserted verbatim with no analysis.
    Raw(String),
}

impl From<&str> for QuoteValue {
    fn from(s: &str) -> Self {
        QuoteValue::Str(s.to_string())
    }
}

impl From<String> for QuoteValue {
    fn from(s: String) -> Self {
        QuoteValue::Str(s)
    }
}

impl From<i64> for QuoteValue {
    fn from(n: i64) -> Self {
        QuoteValue::Number(n.to_string())
    }
}

impl From<f64> for QuoteValue {
    fn from(n: f64) -> Self {
        QuoteValue::Number(n.to_string())
    }
}

impl From<bool> for QuoteValue {
    fn from(b: bool) -> Self {
        QuoteValue::Bool(b)
    }
}

const SAFE_EXTRA: &str = "_./:=@%+-";

/// `^[A-Za-z0-9_./:=@%+-]+$`, checked without pulling in a regex engine —
/// the character class is small enough that a manual scan is both the
/// simplest and the fastest option.
fn is_safe_unquoted(s: &str) -> bool {
    !s.is_empty()
        && !s.chars().any(char::is_whitespace)
        && s.chars().all(|c| c.is_ascii_alphanumeric() || SAFE_EXTRA.contains(c))
}

/// If `s` is fully wrapped in one matching pair of quotes, returns that
/// quote character.
fn fully_wrapped_quote(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'\'' || first == b'"') {
            return Some(first as char);
        }
    }
    None
}

/// Best-effort check for "looks like a complete JSON document": starts
/// with `{`/`[` and actually parses.
fn looks_like_json(s: &str) -> bool {
    let trimmed = s.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    serde_json::from_str::<serde_json::Value>(s).is_ok()
}

fn single_quote_wrap(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn double_quote_wrap_escaping(s: &str, quote_char: char) -> String {
    let escaped = s.replace(quote_char, &format!("\\{quote_char}"));
    format!("\"{escaped}\"")
}

/// Apply the interpolation policy of spec.md §3 to a scalar string.
fn quote_scalar(s: &str, flanked_by: Option<char>) -> String {
    // Pre-wrapped by user quotes in the surrounding literal: the
    // placeholder already sits between a matching pair, so insert
    // verbatim rather than double-wrapping.
    if matches!(flanked_by, Some('\'') | Some('"')) {
        return s.to_string();
    }

    if is_safe_unquoted(s) {
        return s.to_string();
    }

    if let Some(orig_quote) = fully_wrapped_quote(s) {
        let inner = &s[1..s.len() - 1];
        let opposite = if orig_quote == '\'' { '"' } else { '\'' };
        if opposite == '"' {
            return double_quote_wrap_escaping(inner, orig_quote);
        }
        // Re-wrapping in single quotes: bash single quotes support no
        // escapes, so the only safe way to carry a literal single quote
        // through is the close-escape-reopen idiom used by
        // `single_quote_wrap` elsewhere, applied to an inner string that
        // may itself contain the original (double) quote character.
        let escaped = inner.replace(orig_quote, &format!("\\{orig_quote}"));
        return single_quote_wrap(&escaped);
    }

    if looks_like_json(s) {
        return double_quote_wrap_escaping(s, '"');
    }

    single_quote_wrap(s)
}

/// Produce a shell-safe fragment for `value`, given the characters
/// immediately before/after its placeholder (`flanked_by` should be
/// `Some(c)` only when both sides carry the *same* quote character `c`).
pub fn quote(value: &QuoteValue, flanked_by: Option<char>) -> String {
    match value {
        QuoteValue::Null => "''".to_string(),
        QuoteValue::Raw(s) => s.clone(),
        QuoteValue::List(items) => items
            .iter()
            .map(|item| quote(item, None))
            .collect::<Vec<_>>()
            .join(" "),
        QuoteValue::Bool(b) => quote_scalar(&b.to_string(), flanked_by),
        QuoteValue::Number(n) => quote_scalar(n, flanked_by),
        QuoteValue::Str(s) => quote_scalar(s, flanked_by),
    }
}

/// Wrap a string so it is inserted verbatim, bypassing all quoting
/// analysis — the Rust equivalent of the host language's `raw(x)`.
pub fn raw(s: impl Into<String>) -> QuoteValue {
    QuoteValue::Raw(s.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_values_pass_through() {
        assert_eq!(quote(&"hello".into(), None), "hello");
        assert_eq!(quote(&"a.b-c_d:e@f%g+h".into(), None), "a.b-c_d:e@f%g+h");
    }

    #[test]
    fn null_becomes_empty_quotes() {
        assert_eq!(quote(&QuoteValue::Null, None), "''");
    }

    #[test]
    fn dangerous_characters_get_single_quoted() {
        for v in ["a b", "a;b", "a&b", "a|b", "a$b", "a(b)", "a<b>", "a\nb"] {
            let q = quote(&v.into(), None);
            assert!(q.starts_with('\'') && q.ends_with('\''), "{v:?} -> {q:?}");
        }
    }

    #[test]
    fn embedded_single_quote_is_escaped() {
        assert_eq!(quote(&"it's".into(), None), "'it'\\''s'");
    }

    #[test]
    fn raw_bypasses_quoting() {
        assert_eq!(quote(&raw("$(date)"), None), "$(date)");
    }

    #[test]
    fn command_substitution_text_is_not_executed_just_quoted() {
        let q = quote(&"$(date)".into(), None);
        assert_eq!(q, "'$(date)'");
    }

    #[test]
    fn json_document_is_double_quoted() {
        assert_eq!(quote(&r#"{"a":1}"#.into(), None), "\"{\\\"a\\\":1}\"");
    }

    #[test]
    fn pre_wrapped_by_matching_quotes_is_untouched() {
        assert_eq!(quote(&"anything at all".into(), Some('"')), "anything at all");
    }

    #[test]
    fn list_values_join_with_single_space() {
        let list = QuoteValue::List(vec!["a".into(), "b c".into()]);
        assert_eq!(quote(&list, None), "a 'b c'");
    }

    #[test]
    fn fully_wrapped_single_quotes_rewrap_as_double() {
        assert_eq!(quote(&"'hi'".into(), None), "\"hi\"");
    }

    #[test]
    fn fully_wrapped_double_quotes_rewrap_as_single() {
        assert_eq!(quote(&"\"hi\"".into(), None), "'hi'");
    }
}
