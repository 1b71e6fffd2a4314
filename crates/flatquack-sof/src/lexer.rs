//! FHIRPath tokenizer (spec.md §4.1).
//!
//! Scans the input string, skipping whitespace. String literals use single
//! quotes with backslash escapes. Numeric literals allow an optional decimal
//! point. Identifiers match `[A-Za-z_][A-Za-z0-9_]*`. `$this` and `%name` are
//! dedicated token kinds.

use crate::error::{CompileError, CompileErrorKind, Result};
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, start));
                break;
            };

            let kind = match c {
                '.' => {
                    self.advance();
                    TokenKind::Dot
                }
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                '[' => {
                    self.advance();
                    TokenKind::LBracket
                }
                ']' => {
                    self.advance();
                    TokenKind::RBracket
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '+' => {
                    self.advance();
                    TokenKind::Plus
                }
                '-' => {
                    self.advance();
                    TokenKind::Minus
                }
                '*' => {
                    self.advance();
                    TokenKind::Star
                }
                '/' => {
                    self.advance();
                    TokenKind::Slash
                }
                '=' => {
                    self.advance();
                    TokenKind::Eq
                }
                '!' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::Ne
                    } else {
                        return Err(CompileError::at_offset(
                            CompileErrorKind::ParseError,
                            "unexpected '!' (expected '!=')",
                            self.source,
                            start,
                        ));
                    }
                }
                '<' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::Le
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '\'' => self.read_string(start)?,
                '%' => self.read_variable(start)?,
                '$' => self.read_this(start)?,
                c if c.is_ascii_digit() => self.read_number(start),
                c if c.is_alphabetic() || c == '_' => self.read_identifier_or_keyword(start),
                other => {
                    return Err(CompileError::at_offset(
                        CompileErrorKind::ParseError,
                        format!("unexpected character '{other}'"),
                        self.source,
                        start,
                    ));
                }
            };

            tokens.push(Token::new(kind, start));
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_string(&mut self, start: usize) -> Result<TokenKind> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some('\'') => value.push('\''),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => {
                        return Err(CompileError::at_offset(
                            CompileErrorKind::ParseError,
                            "unterminated escape in string literal",
                            self.source,
                            start,
                        ));
                    }
                },
                Some(c) => value.push(c),
                None => {
                    return Err(CompileError::at_offset(
                        CompileErrorKind::ParseError,
                        "unterminated string literal",
                        self.source,
                        start,
                    ));
                }
            }
        }
        Ok(TokenKind::String(value))
    }

    fn read_variable(&mut self, start: usize) -> Result<TokenKind> {
        self.advance(); // '%'
        let mut name = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            name.push(self.advance().unwrap());
        }
        if name.is_empty() {
            return Err(CompileError::at_offset(
                CompileErrorKind::ParseError,
                "expected identifier after '%'",
                self.source,
                start,
            ));
        }
        Ok(TokenKind::Variable(name))
    }

    fn read_this(&mut self, start: usize) -> Result<TokenKind> {
        // only '$this' is a recognized token
        let rest: String = self.chars[self.pos..].iter().take(5).collect();
        if rest == "$this" {
            for _ in 0..5 {
                self.advance();
            }
            Ok(TokenKind::ThisRef)
        } else {
            Err(CompileError::at_offset(
                CompileErrorKind::ParseError,
                "unexpected '$' (only '$this' is supported)",
                self.source,
                start,
            ))
        }
    }

    fn read_number(&mut self, _start: usize) -> TokenKind {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            text.push(self.advance().unwrap()); // '.'
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
        }
        TokenKind::Number(text)
    }

    fn read_identifier_or_keyword(&mut self, _start: usize) -> TokenKind {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            text.push(self.advance().unwrap());
        }
        match text.as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(text),
        }
    }
}
