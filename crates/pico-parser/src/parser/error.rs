//! Parse error types

use crate::token::{Span, Token};
use thiserror::Error;

/// A parse error with location and contextual information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at {}:{}: {message}", span.line, span.column)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,

    /// Source location of the error
    pub span: Span,

    /// Human-readable error message
    pub message: String,
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token found
    UnexpectedToken { expected: Vec<Token>, found: Token },

    /// Unexpected end of file
    UnexpectedEof { expected: Vec<Token> },

    /// Invalid syntax
    InvalidSyntax { reason: String },
}

fn describe(expected: &[Token]) -> String {
    match expected {
        [] => "an expression".to_string(),
        [one] => format!("'{}'", one),
        many => {
            let names: Vec<String> = many.iter().map(|tok| format!("'{}'", tok)).collect();
            format!("one of {}", names.join(", "))
        }
    }
}

impl ParseError {
    /// Create an "unexpected token" error.
    ///
    /// An empty `expected` list means any expression would have been accepted.
    pub fn unexpected_token(expected: Vec<Token>, found: Token, span: Span) -> Self {
        let message = format!("expected {}, found '{}'", describe(&expected), found);
        Self {
            kind: ParseErrorKind::UnexpectedToken { expected, found },
            span,
            message,
        }
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(expected: Vec<Token>, span: Span) -> Self {
        let message = format!("unexpected end of file, expected {}", describe(&expected));
        Self {
            kind: ParseErrorKind::UnexpectedEof { expected },
            span,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        Self {
            message: reason.clone(),
            kind: ParseErrorKind::InvalidSyntax { reason },
            span,
        }
    }
}
