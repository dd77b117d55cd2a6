//! Operand parsing

use crate::error::{AsmError, AsmResult};
use regex::Regex;
use std::sync::LazyLock;

static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_.A-Za-z][@\w.]*$").expect("label pattern"));

/// A parsed operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Number(Number),
    /// Character literal, as its code point
    Char(u8),
    Str(Vec<u8>),
    Label(String),
    /// Bracketed address
    Memory(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Number {
    pub value: i64,
    /// Digit count of a hexadecimal literal
    pub hex_digits: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Address {
    Absolute(i64),
    Label { name: String, offset: i64 },
    /// `[SFP ± n]`
    Frame(i64),
}

impl Operand {
    /// Parse one operand. `scope` is the enclosing global label used to
    /// qualify `.local` references.
    pub fn parse(text: &str, line: usize, scope: Option<&str>) -> AsmResult<Self> {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| AsmError::syntax(line, format!("unclosed bracket in '{}'", text)))?;
            return parse_address(inner, line, scope).map(Operand::Memory);
        }
        if text.starts_with('"') {
            return parse_quoted(text, '"', line).map(Operand::Str);
        }
        if text.starts_with('\'') {
            let bytes = parse_quoted(text, '\'', line)?;
            return match bytes.as_slice() {
                [c] => Ok(Operand::Char(*c)),
                _ => Err(AsmError::syntax(
                    line,
                    format!("character literal {} must hold one byte", text),
                )),
            };
        }
        if LABEL.is_match(text) {
            return Ok(Operand::Label(qualify(text, scope)));
        }
        parse_number(text, line).map(Operand::Number)
    }
}

/// Expand a `.local` label under its enclosing global label.
pub(crate) fn qualify(name: &str, scope: Option<&str>) -> String {
    match scope {
        Some(parent) if name.starts_with('.') => format!("{}{}", parent, name),
        _ => name.to_string(),
    }
}

pub(crate) fn parse_number(text: &str, line: usize) -> AsmResult<Number> {
    let invalid = || AsmError::syntax(line, format!("invalid number '{}'", text));

    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if body.is_empty() {
        return Err(invalid());
    }

    let lower = body.to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(octal) = lower.strip_prefix("0o") {
        (octal, 8)
    } else if let Some(binary) = lower.strip_suffix('b') {
        (binary, 2)
    } else if let Some(decimal) = lower.strip_suffix('d') {
        (decimal, 10)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = i64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    Ok(Number {
        value: if negative { -magnitude } else { magnitude },
        hex_digits: (radix == 16).then_some(digits.len()),
    })
}

fn parse_address(inner: &str, line: usize, scope: Option<&str>) -> AsmResult<Address> {
    let inner = inner.trim();
    // Split at the first sign that follows the base.
    let split = inner
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '+' || c == '-')
        .map(|(i, _)| i);
    let (base, offset) = match split {
        Some(i) => {
            let offset = parse_number(&inner[i..].replace(char::is_whitespace, ""), line)?;
            (inner[..i].trim(), offset.value)
        }
        None => (inner, 0),
    };
    if base.is_empty() {
        return Err(AsmError::syntax(line, "empty address"));
    }

    if base.eq_ignore_ascii_case("SFP") {
        Ok(Address::Frame(offset))
    } else if LABEL.is_match(base) {
        Ok(Address::Label {
            name: qualify(base, scope),
            offset,
        })
    } else {
        Ok(Address::Absolute(parse_number(base, line)?.value + offset))
    }
}

fn parse_quoted(text: &str, quote: char, line: usize) -> AsmResult<Vec<u8>> {
    let unterminated = || AsmError::syntax(line, format!("unterminated literal {}", text));
    let body = text[1..].strip_suffix(quote).ok_or_else(unterminated)?;

    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some(c @ ('\\' | '\'' | '"')) => c,
                Some(other) => {
                    return Err(AsmError::syntax(line, format!("unknown escape '\\{}'", other)))
                }
                None => return Err(unterminated()),
            }
        } else {
            c
        };
        let mut buf = [0; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    Ok(bytes)
}
