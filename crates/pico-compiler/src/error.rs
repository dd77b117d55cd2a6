//! Compilation errors

use pico_parser::{LexError, ParseError, Span};
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{file}: {}", join_lex_errors(.errors))]
    Lex { file: String, errors: Vec<LexError> },

    #[error("{file}: {error}")]
    Parse { file: String, error: ParseError },

    #[error("{file}: {error}")]
    Semantic { file: String, error: SemanticError },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

fn join_lex_errors(errors: &[LexError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CompileError {
    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }

    /// Source location of the first problem, where one is known.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex { errors, .. } => errors.first().map(LexError::span),
            CompileError::Parse { error, .. } => Some(error.span),
            CompileError::Semantic { error, .. } => Some(error.span),
            CompileError::Internal { .. } => None,
        }
    }

    /// The semantic error kind, if this is a semantic error.
    pub fn semantic_kind(&self) -> Option<&SemanticErrorKind> {
        match self {
            CompileError::Semantic { error, .. } => Some(&error.kind),
            _ => None,
        }
    }
}

/// An error found while resolving names and types.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {}:{}", span.line, span.column)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("'{0}' is not a function")]
    NotCallable(String),

    #[error("'{0}' is a function, not a value")]
    NotAValue(String),

    #[error("left side of an assignment must be an identifier")]
    AssignToNonIdentifier,

    #[error("duplicate definition of '{0}'")]
    DuplicateDefinition(String),

    #[error("'{name}' takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}
