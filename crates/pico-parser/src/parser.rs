//! Parser for picolang.
//!
//! A recursive descent parser for statements with precedence climbing for
//! binary operators. Parsing stops at the first error; no partial tree is
//! ever returned.

pub mod error;
mod expr;
pub mod precedence;
mod stmt;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::lexer::{LexError, Lexer};
use crate::token::{Span, Token};

pub use error::{ParseError, ParseErrorKind};

/// Parser state for picolang.
pub struct Parser {
    /// Pre-tokenized input, always terminated by [`Token::Eof`]
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Arena receiving the nodes
    ast: Ast,
}

impl Parser {
    /// Create a new parser from source code.
    pub fn new(source: &str) -> Result<Self, Vec<LexError>> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Create a parser over an existing token stream.
    pub fn from_tokens(mut tokens: Vec<(Token, Span)>) -> Self {
        if !matches!(tokens.last(), Some((Token::Eof, _))) {
            let eof_span = match tokens.last() {
                Some((_, last)) => Span::new(last.end, last.end, last.line, last.column),
                None => Span::new(0, 0, 1, 1),
            };
            tokens.push((Token::Eof, eof_span));
        }

        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    /// Parse the whole input into a compilation unit.
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        let start_span = self.current_span();
        let mut items = Vec::new();

        while !self.at_eof() {
            let item = if self.check(&Token::Def) {
                self.parse_function_def()?
            } else {
                self.parse_statement()?
            };
            items.push(item);
        }

        let span = match items.last() {
            Some(&last) => start_span.merge(&self.ast.span(last)),
            None => start_span,
        };
        let root = self.ast.alloc(NodeKind::CompilationUnit(items), span);
        self.ast.set_root(root);
        Ok(self.ast)
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Peek at the next token (lookahead).
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(tok, _)| tok)
    }

    /// Advance to the next token, returning the previous current token.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Check if the current token matches the given kind.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    /// Check if we've reached EOF.
    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Consume the current token if it matches the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(vec![expected]))
        }
    }

    /// Consume an identifier and return its name.
    pub fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Identifier(name) = self.current() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected_token(vec![Token::Identifier("identifier".to_string())]))
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Create an "unexpected token" error at the current position.
    fn unexpected_token(&self, expected: Vec<Token>) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected, span)
        } else {
            ParseError::unexpected_token(expected, self.current().clone(), span)
        }
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.ast.alloc(kind, span)
    }

    /// Span from `start` up to the end of node `id`.
    fn span_to(&self, start: Span, id: NodeId) -> Span {
        start.merge(&self.ast.span(id))
    }
}
