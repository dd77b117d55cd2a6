//! Line grammar
//!
//! `[label:] [MNEMONIC [operand]] [; comment]`

use crate::error::{AsmError, AsmResult};
use regex::Regex;
use std::sync::LazyLock;

static LABEL_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([_.A-Za-z][@\w.]*)\s*:").expect("label definition pattern")
});

static MNEMONIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{1,7}$").expect("mnemonic pattern"));

/// One source line split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SourceLine<'a> {
    pub label: Option<&'a str>,
    pub mnemonic: Option<&'a str>,
    pub operand: Option<&'a str>,
}

impl<'a> SourceLine<'a> {
    pub fn parse(text: &'a str, line: usize) -> AsmResult<Self> {
        let mut rest = strip_comment(text);
        let mut parsed = SourceLine::default();

        if let Some(caps) = LABEL_DEF.captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            parsed.label = caps.get(1).map(|m| m.as_str());
            rest = &rest[whole..];
        }

        let rest = rest.trim();
        if rest.is_empty() {
            return Ok(parsed);
        }

        let (head, operand) = match rest.find(char::is_whitespace) {
            Some(split) => (&rest[..split], rest[split..].trim()),
            None => (rest, ""),
        };
        if !MNEMONIC.is_match(head) {
            return Err(AsmError::syntax(line, format!("expected a mnemonic, found '{}'", head)));
        }
        parsed.mnemonic = Some(head);
        if !operand.is_empty() {
            parsed.operand = Some(operand);
        }
        Ok(parsed)
    }
}

/// Cut a trailing `;` comment, ignoring semicolons inside quotes.
pub(crate) fn strip_comment(text: &str) -> &str {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ';') => return &text[..i],
            _ => {}
        }
    }
    text
}

/// Split a comma-separated operand list, ignoring commas inside quotes.
pub(crate) fn split_operands(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ',') => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}
