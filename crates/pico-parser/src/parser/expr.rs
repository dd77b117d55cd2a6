//! Expression parsing: blocks, conditionals, loops, and operator expressions.

use super::precedence::{binary_op, get_precedence, is_right_associative, Precedence};
use super::{ParseError, Parser};
use crate::ast::{Literal, NodeId, NodeKind, UnaryOp};
use crate::token::Token;

impl Parser {
    /// Parse an expression.
    ///
    /// A `{` block, `if` and `while` are expressions on their own; anything
    /// else is a primary followed by binary operators.
    pub(super) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.current() {
            Token::LeftBrace => self.parse_block(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            _ => {
                let lhs = self.parse_primary()?;
                self.parse_binary_rhs(Precedence::Assignment.value(), lhs)
            }
        }
    }

    /// Precedence climbing over binary operators binding at least `min_prec`.
    fn parse_binary_rhs(&mut self, min_prec: u8, mut lhs: NodeId) -> Result<NodeId, ParseError> {
        loop {
            let prec = get_precedence(self.current());
            if prec == Precedence::None || prec.value() < min_prec {
                return Ok(lhs);
            }

            let op_token = self.advance();
            let Some(op) = binary_op(&op_token) else {
                return Ok(lhs);
            };

            let mut rhs = self.parse_primary()?;

            let next_prec = get_precedence(self.current());
            if next_prec != Precedence::None
                && (prec < next_prec || (prec == next_prec && is_right_associative(&op_token)))
            {
                let inner_min = if prec == next_prec {
                    prec.value()
                } else {
                    prec.value() + 1
                };
                rhs = self.parse_binary_rhs(inner_min, rhs)?;
            }

            let span = self.ast.span(lhs).merge(&self.ast.span(rhs));
            lhs = self.alloc(NodeKind::Binary { op, left: lhs, right: rhs }, span);
        }
    }

    /// Parse a unary expression, literal, identifier, call, or parenthesized
    /// expression.
    pub(super) fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();

        let unary = match self.current() {
            Token::Plus => Some(UnaryOp::Plus),
            Token::Minus => Some(UnaryOp::Minus),
            Token::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance();
            let operand = self.parse_primary()?;
            let span = self.span_to(start, operand);
            return Ok(self.alloc(NodeKind::Unary { op, operand }, span));
        }

        match self.current().clone() {
            Token::IntLiteral(n) => {
                self.advance();
                Ok(self.alloc(NodeKind::Literal(Literal::Int(n)), start))
            }
            Token::FloatLiteral(n) => {
                self.advance();
                Ok(self.alloc(NodeKind::Literal(Literal::Float(n)), start))
            }
            Token::CharLiteral(c) => {
                self.advance();
                Ok(self.alloc(NodeKind::Literal(Literal::Int(c as u32 as i32)), start))
            }
            Token::Identifier(name) => {
                self.advance();
                let ident = self.alloc(NodeKind::Identifier(name), start);
                self.parse_call_suffix(ident)
            }
            Token::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                self.parse_call_suffix(inner)
            }
            Token::StringLiteral(_) => Err(ParseError::invalid_syntax(
                "string literals are only allowed as the operand of __asm__",
                start,
            )),
            Token::Def => Err(ParseError::invalid_syntax(
                "function definitions are only allowed at top level",
                start,
            )),
            _ => Err(self.unexpected_token(Vec::new())),
        }
    }

    /// Parse `( args )` if it directly follows `callee`.
    fn parse_call_suffix(&mut self, callee: NodeId) -> Result<NodeId, ParseError> {
        if !self.check(&Token::LeftParen) {
            return Ok(callee);
        }
        self.advance();

        let mut args = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let end = self.current_span();
        if !self.check(&Token::RightParen) {
            return Err(self.unexpected_token(vec![Token::Comma, Token::RightParen]));
        }
        self.advance();

        let span = self.ast.span(callee).merge(&end);
        Ok(self.alloc(NodeKind::Call { callee, args }, span))
    }

    /// Parse `if cond then [else otherwise]`.
    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(Token::If)?;

        let condition = self.parse_expression()?;
        let then_branch = self.parse_expression()?;
        let else_branch = if self.check(&Token::Else) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        let span = self.span_to(start, else_branch.unwrap_or(then_branch));
        Ok(self.alloc(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    /// Parse `while cond body`.
    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(Token::While)?;

        let condition = self.parse_expression()?;
        let body = self.parse_expression()?;

        let span = self.span_to(start, body);
        Ok(self.alloc(NodeKind::While { condition, body }, span))
    }
}
