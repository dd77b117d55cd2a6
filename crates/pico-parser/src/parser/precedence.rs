//! Operator precedence table for binary expressions.

use crate::ast::BinaryOp;
use crate::token::Token;

/// Binding power of a binary operator (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Assignment = 2,      // =
    Comparison = 10,     // ==, !=, <, >, <=, >=
    Additive = 20,       // +, -
    Multiplicative = 40, // *, /
}

impl Precedence {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Get the precedence of a binary operator token.
pub fn get_precedence(token: &Token) -> Precedence {
    match token {
        Token::Equal => Precedence::Assignment,

        Token::EqualEqual
        | Token::BangEqual
        | Token::Less
        | Token::LessEqual
        | Token::Greater
        | Token::GreaterEqual => Precedence::Comparison,

        Token::Plus | Token::Minus => Precedence::Additive,

        Token::Star | Token::Slash => Precedence::Multiplicative,

        _ => Precedence::None,
    }
}

/// Check if an operator is right-associative.
pub fn is_right_associative(token: &Token) -> bool {
    matches!(token, Token::Equal)
}

/// Map a binary operator token to its AST operator.
pub fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Equal => BinaryOp::Assign,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Subtract,
        Token::Star => BinaryOp::Multiply,
        Token::Slash => BinaryOp::Divide,
        Token::EqualEqual => BinaryOp::Equal,
        Token::BangEqual => BinaryOp::NotEqual,
        Token::Less => BinaryOp::Less,
        Token::LessEqual => BinaryOp::LessEqual,
        Token::Greater => BinaryOp::Greater,
        Token::GreaterEqual => BinaryOp::GreaterEqual,
        _ => return None,
    };
    Some(op)
}
