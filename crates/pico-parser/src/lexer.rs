//! Lexer for picolang.
//!
//! Built on the logos library. Converts source text into a stream of tokens
//! with line and column information for diagnostics.

use crate::token::{Span, Token};
use logos::Logos;
use thiserror::Error;

/// Logos-based token enum for lexing.
///
/// Converted to the public [`Token`] enum after lexing, which is where
/// numeric literals get validated.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    // Whitespace (skip)
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    // Keywords (must come before identifiers)
    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("while")]
    While,

    #[token("continue")]
    Continue,

    #[token("break")]
    Break,

    #[token("return")]
    Return,

    #[token("def")]
    Def,

    #[token("__asm__")]
    Asm,

    // Literals
    #[regex(r"[0-9.]+", |lex| lex.slice().to_owned())]
    Number(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    StringLiteral(String),

    #[regex(r"'([^'\\\n]|\\.)'", parse_char)]
    CharLiteral(char),

    // Identifiers
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    // Two-character operators (longest match wins)
    #[token("==")]
    EqualEqual,

    #[token("!=")]
    BangEqual,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    // Single-character operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("=")]
    Equal,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("!")]
    Bang,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(",")]
    Comma,
}

fn parse_string(lex: &mut logos::Lexer<LogosToken>) -> String {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn parse_char(lex: &mut logos::Lexer<LogosToken>) -> Option<char> {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1]).chars().next()
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some(c) => result.push(c),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Classify a run of digits and dots as an integer or float literal.
///
/// All digits is an integer; `digits? '.' digits` is a float; anything else
/// (`1.2.3`, `1.`, `.`) is malformed.
fn classify_number(text: &str) -> Option<Token> {
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if is_digits(text) {
        return text.parse::<i32>().ok().map(Token::IntLiteral);
    }

    let (whole, fraction) = text.split_once('.')?;
    if (whole.is_empty() || is_digits(whole)) && is_digits(fraction) {
        text.parse::<f32>().ok().map(Token::FloatLiteral)
    } else {
        None
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{char}' at {}:{}", span.line, span.column)]
    UnexpectedCharacter { char: char, span: Span },

    #[error("invalid number '{text}' at {}:{}", span.line, span.column)]
    InvalidNumber { text: String, span: Span },

    #[error("unterminated string at {}:{}", span.line, span.column)]
    UnterminatedString { span: Span },

    #[error("invalid character literal at {}:{}", span.line, span.column)]
    InvalidCharLiteral { span: Span },
}

impl LexError {
    /// Source location of the error.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidCharLiteral { span } => *span,
        }
    }
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole source, appending a trailing [`Token::Eof`].
    ///
    /// Lexing continues past errors so that every bad character in the file
    /// gets reported at once.
    pub fn tokenize(mut self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut logos_lexer = LogosToken::lexer(self.source);
        let mut line = 1u32;
        let mut column = 1u32;
        let mut last_end = 0;

        while let Some(token_result) = logos_lexer.next() {
            let range = logos_lexer.span();

            // Update line and column based on skipped text
            advance_position(&self.source[last_end..range.start], &mut line, &mut column);

            let span = Span::new(range.start, range.end, line, column);

            match token_result {
                Ok(logos_token) => match self.convert_token(logos_token, span) {
                    Ok(token) => self.tokens.push((token, span)),
                    Err(err) => self.errors.push(err),
                },
                Err(_) => {
                    let err = self.classify_error(span);
                    self.errors.push(err);
                }
            }

            advance_position(&self.source[range.start..range.end], &mut line, &mut column);
            last_end = range.end;
        }

        advance_position(&self.source[last_end..], &mut line, &mut column);
        let eof_span = Span::new(self.source.len(), self.source.len(), line, column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn convert_token(&self, logos_token: LogosToken, span: Span) -> Result<Token, LexError> {
        let token = match logos_token {
            LogosToken::If => Token::If,
            LogosToken::Else => Token::Else,
            LogosToken::While => Token::While,
            LogosToken::Continue => Token::Continue,
            LogosToken::Break => Token::Break,
            LogosToken::Return => Token::Return,
            LogosToken::Def => Token::Def,
            LogosToken::Asm => Token::Asm,
            LogosToken::Number(text) => match classify_number(&text) {
                Some(token) => token,
                None => return Err(LexError::InvalidNumber { text, span }),
            },
            LogosToken::StringLiteral(s) => Token::StringLiteral(s),
            LogosToken::CharLiteral(c) => Token::CharLiteral(c),
            LogosToken::Identifier(name) => Token::Identifier(name),
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::BangEqual => Token::BangEqual,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Equal => Token::Equal,
            LogosToken::Less => Token::Less,
            LogosToken::Greater => Token::Greater,
            LogosToken::Bang => Token::Bang,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::Comma => Token::Comma,
            LogosToken::Whitespace | LogosToken::LineComment => {
                unreachable!("Whitespace and comments should be skipped")
            }
        };
        Ok(token)
    }

    fn classify_error(&self, span: Span) -> LexError {
        let char = self.source[span.start..].chars().next().unwrap_or('\0');
        match char {
            '"' => LexError::UnterminatedString { span },
            '\'' => LexError::InvalidCharLiteral { span },
            _ => LexError::UnexpectedCharacter { char, span },
        }
    }
}

fn advance_position(text: &str, line: &mut u32, column: &mut u32) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}
