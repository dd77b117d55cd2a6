//! picolang front end
//!
//! Lexer, AST arena and parser for picolang, a small expression-oriented
//! language compiled to picovm assembly.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Ast, BinaryOp, Literal, Node, NodeId, NodeKind, PrimitiveType, SymbolId, UnaryOp};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use token::{Span, Token};
