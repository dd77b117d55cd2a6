//! Statement parsing: statement lists, jumps, inline assembly and function
//! definitions.

use super::{ParseError, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::token::Token;

impl Parser {
    /// Parse one statement: `break`, `continue`, `return expr`,
    /// `__asm__ "text"`, or an expression.
    pub(super) fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        match self.current() {
            Token::Break => {
                self.advance();
                Ok(self.alloc(NodeKind::Break, start))
            }
            Token::Continue => {
                self.advance();
                Ok(self.alloc(NodeKind::Continue, start))
            }
            Token::Return => {
                self.advance();
                let value = self.parse_expression()?;
                let span = self.span_to(start, value);
                Ok(self.alloc(NodeKind::Return { value }, span))
            }
            Token::Asm => {
                self.advance();
                let end = self.current_span();
                let Token::StringLiteral(text) = self.current().clone() else {
                    return Err(self.unexpected_token(vec![Token::StringLiteral(String::new())]));
                };
                self.advance();
                Ok(self.alloc(NodeKind::InlineAsm(text), start.merge(&end)))
            }
            _ => self.parse_expression(),
        }
    }

    /// Parse `{ statement* }`.
    pub(super) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(Token::LeftBrace)?;

        let mut items = Vec::new();
        while !self.check(&Token::RightBrace) {
            if self.at_eof() {
                return Err(self.unexpected_token(vec![Token::RightBrace]));
            }
            items.push(self.parse_statement()?);
        }

        let end = self.current_span();
        self.advance();
        Ok(self.alloc(NodeKind::StatementList(items), start.merge(&end)))
    }

    /// Parse `def name(params) body`.
    pub(super) fn parse_function_def(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(Token::Def)?;

        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;

        let span = self.span_to(start, body);
        Ok(self.alloc(NodeKind::FunctionDef { prototype, body }, span))
    }

    /// Parse `name(a, b, ...)`.
    fn parse_prototype(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let name = self.expect_identifier()?;
        self.expect(Token::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let end = self.current_span();
        self.expect(Token::RightParen)?;
        Ok(self.alloc(NodeKind::Prototype { name, params }, start.merge(&end)))
    }
}
