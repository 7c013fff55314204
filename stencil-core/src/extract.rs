//! Dynamic-text detection and free-variable extraction.
//!
//! A string is dynamic when it holds at least one `${ ... }` span. Spans are
//! non-greedy and do not nest: the first `}` after `${` closes the span.

use indexmap::IndexSet;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Expr(&'a str),
}

/// Split `text` into literal runs and `${}` expression spans. An unterminated
/// `${` stays literal.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("${") {
        let Some(close) = rest[open + 2..].find('}') else {
            break;
        };
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        out.push(Segment::Expr(&rest[open + 2..open + 2 + close]));
        rest = &rest[open + 2 + close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

pub fn is_dynamic(text: &str) -> bool {
    segments(text).iter().any(|s| matches!(s, Segment::Expr(_)))
}

/// Names the extractor never reports as free variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Refers to the data object itself. Always allowed, never bound.
    pub self_name: String,
    /// Language keywords and literal names.
    pub reserved: Vec<String>,
    /// Ambient names resolved by the evaluator without binding.
    pub globals: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        let words = |ws: &[&str]| ws.iter().map(|w| w.to_string()).collect();
        Self {
            self_name: "this".into(),
            reserved: words(&[
                "true", "false", "null", "undefined", "typeof", "instanceof", "in", "of", "new",
                "void", "delete", "var", "let", "const", "function", "return", "if", "else",
            ]),
            globals: words(&[
                "Math", "String", "Number", "Boolean", "JSON", "Array", "Object", "NaN",
                "Infinity",
            ]),
        }
    }
}

impl ExtractOptions {
    fn excludes(&self, ident: &str) -> bool {
        self.reserved.iter().any(|w| w == ident) || self.globals.iter().any(|w| w == ident)
    }
}

fn ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Identifier-shaped tokens of `expr` that must be bound from the data object.
///
/// A token is skipped when the nearest preceding non-whitespace character is
/// a quote (string fragment) or a dot (member access).
pub fn free_variables(expr: &str, opts: &ExtractOptions) -> Vec<String> {
    let bytes = expr.as_bytes();
    let mut refs: IndexSet<&str> = IndexSet::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            // numeric literal, exponent and suffix included
            while i < bytes.len() && (ident_continue(bytes[i]) || bytes[i] == b'.') {
                i += 1;
            }
            continue;
        }
        if !ident_start(b) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && ident_continue(bytes[i]) {
            i += 1;
        }
        let token = &expr[start..i];
        let before = expr[..start].trim_end().bytes().next_back();
        if matches!(before, Some(b'\'' | b'"' | b'.')) {
            continue;
        }
        if token == opts.self_name || opts.excludes(token) {
            continue;
        }
        refs.insert(token);
    }
    refs.into_iter().map(str::to_string).collect()
}
