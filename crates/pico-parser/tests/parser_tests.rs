//! Parser integration tests over whole programs.

use pico_parser::ast::{BinaryOp, Literal, UnaryOp};
use pico_parser::{Ast, NodeId, NodeKind, ParseErrorKind, Parser};

fn parse(source: &str) -> Ast {
    Parser::new(source)
        .expect("lexing failed")
        .parse()
        .expect("parsing failed")
}

fn top_level(ast: &Ast) -> Vec<NodeId> {
    match ast.kind(ast.root().expect("missing root")) {
        NodeKind::CompilationUnit(items) => items.clone(),
        other => panic!("expected compilation unit, got {:?}", other),
    }
}

#[test]
fn test_program_structure() {
    let ast = parse(
        r#"
        def fact(n) if n < 2 1 else n * fact(n - 1)
        x = fact(5)
        __asm__ "YIELD"
        "#,
    );
    let items = top_level(&ast);
    assert_eq!(items.len(), 3);
    assert!(matches!(ast.kind(items[0]), NodeKind::FunctionDef { .. }));
    assert!(matches!(
        ast.kind(items[1]),
        NodeKind::Binary {
            op: BinaryOp::Assign,
            ..
        }
    ));
    assert_eq!(ast.kind(items[2]), &NodeKind::InlineAsm("YIELD".into()));
}

#[test]
fn test_negative_literal_stays_unary() {
    let ast = parse("x = -2.5");
    let NodeKind::Binary { right, .. } = *ast.kind(top_level(&ast)[0]) else {
        panic!("expected assignment");
    };
    let NodeKind::Unary { op, operand } = *ast.kind(right) else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Minus);
    assert_eq!(ast.kind(operand), &NodeKind::Literal(Literal::Float(2.5)));
}

#[test]
fn test_parent_links_cover_whole_tree() {
    let mut ast = parse("def f(a) { b = a while b { b = b - 1 } b }");
    let root = ast.root().unwrap();
    ast.link_parents(root, None);

    // Every reachable node except the root has an enclosing node
    let mut stack = vec![root];
    let mut visited = 0;
    while let Some(id) = stack.pop() {
        visited += 1;
        if id != root {
            assert!(ast.enclosing(id).is_some(), "{:?} has no parent", ast.kind(id));
        }
        stack.extend(ast.kind(id).children());
    }
    assert!(visited > 10);
}

#[test]
fn test_error_positions() {
    let err = Parser::new("x = 1\ny = (2 + 3")
        .unwrap()
        .parse()
        .unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof { .. }));
    assert_eq!(err.span.line, 2);
}

#[test]
fn test_missing_operand() {
    let err = Parser::new("x = 1 +").unwrap().parse().unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof { .. }));
}
