//! Compilation errors surfaced through the pipeline

use super::try_compile;
use pico_compiler::{CompileError, SemanticErrorKind};

fn semantic_kind(source: &str) -> SemanticErrorKind {
    match try_compile(source, true) {
        Err(err) => err
            .semantic_kind()
            .cloned()
            .unwrap_or_else(|| panic!("expected a semantic error, got {}", err)),
        Ok(unit) => panic!("expected an error, got:\n{}", unit.assembly),
    }
}

#[test]
fn test_unknown_identifier() {
    assert_eq!(
        semantic_kind("x = 1\ny + x"),
        SemanticErrorKind::UnknownIdentifier("y".to_string())
    );
}

#[test]
fn test_call_of_a_variable() {
    assert_eq!(
        semantic_kind("x = 1\nx(2)"),
        SemanticErrorKind::NotCallable("x".to_string())
    );
}

#[test]
fn test_arity_mismatch() {
    assert_eq!(
        semantic_kind("def f(a) a\nf(1, 2)"),
        SemanticErrorKind::ArityMismatch {
            name: "f".to_string(),
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn test_assignment_to_expression() {
    assert_eq!(
        semantic_kind("(1 + 2) = 3"),
        SemanticErrorKind::AssignToNonIdentifier
    );
}

#[test]
fn test_duplicate_definition() {
    assert_eq!(
        semantic_kind("def f(a) a\ndef f(b) b\nf(1)"),
        SemanticErrorKind::DuplicateDefinition("f".to_string())
    );
}

#[test]
fn test_parse_error_is_fatal() {
    let err = try_compile("x = (1 + 2", true).unwrap_err();
    assert!(matches!(err, CompileError::Parse { .. }));
    assert!(err.span().is_some());
}

#[test]
fn test_lex_error_is_fatal() {
    let err = try_compile("x = 1 $ 2", true).unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
    assert!(err.to_string().starts_with("test.pico:"));
}
