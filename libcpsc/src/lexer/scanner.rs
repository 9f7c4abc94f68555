// Copyright 2025-2026 Neil Henderson
//
//! The `scanner` module walks the source text character by character and produces tokens.

use crate::compiler_driver::{Diagnostic, Driver, ErrorKind};
use crate::core::SourceLocation;

use super::tokens::{Keyword, Token, TokenType};

/// The scanner holds the cursor state for one pass over the source text.
pub struct Scanner {
    chars: Vec<char>,
    cursor: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    /// Creates a new scanner over the given source text.
    pub fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), cursor: 0, line: 1, column: 1 }
    }

    /// Scans the whole source text and returns the tokens.
    pub fn scan(mut self, driver: &mut Driver) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let loc = self.location();

            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }

                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(driver),

                '(' => tokens.push(self.single(TokenType::OpenParen)),
                ')' => tokens.push(self.single(TokenType::CloseParen)),
                '{' => tokens.push(self.single(TokenType::OpenBrace)),
                '}' => tokens.push(self.single(TokenType::CloseBrace)),
                '[' => tokens.push(self.single(TokenType::OpenSqBracket)),
                ']' => tokens.push(self.single(TokenType::CloseSqBracket)),
                ';' => tokens.push(self.single(TokenType::Semicolon)),
                ':' => tokens.push(self.single(TokenType::Colon)),
                ',' => tokens.push(self.single(TokenType::Comma)),
                '.' => tokens.push(self.single(TokenType::Dot)),
                '+' => tokens.push(self.single(TokenType::Plus)),
                '-' => tokens.push(self.single(TokenType::Minus)),
                '*' => tokens.push(self.single(TokenType::Multiply)),
                '/' => tokens.push(self.single(TokenType::Divide)),
                '%' => tokens.push(self.single(TokenType::Remainder)),
                '?' => tokens.push(self.single(TokenType::Ternary)),

                '=' => tokens.push(self.one_or_two('=', TokenType::Assignment, TokenType::EqualTo)),
                '!' => tokens.push(self.one_or_two('=', TokenType::LogicalNot, TokenType::NotEqualTo)),
                '<' => tokens.push(self.one_or_two('=', TokenType::LessThan, TokenType::LessThanOrEqualTo)),
                '>' => tokens.push(self.one_or_two('=', TokenType::GreaterThan, TokenType::GreaterThanOrEqualTo)),

                '&' => {
                    if self.peek_at(1) == Some('&') {
                        self.advance();
                        self.advance();
                        tokens.push(Token::new(TokenType::LogicalAnd, loc));
                    } else {
                        self.advance();
                        lexical_error(driver, "Unexpected character '&' (did you mean '&&'?)", loc);
                    }
                }

                '|' => {
                    if self.peek_at(1) == Some('|') {
                        self.advance();
                        self.advance();
                        tokens.push(Token::new(TokenType::LogicalOr, loc));
                    } else {
                        self.advance();
                        lexical_error(driver, "Unexpected character '|' (did you mean '||'?)", loc);
                    }
                }

                '"' => {
                    if let Some(token) = self.scan_string_literal(driver) {
                        tokens.push(token);
                    }
                }

                c if c.is_ascii_digit() => tokens.push(self.scan_numeric_literal(driver)),

                c if c.is_ascii_alphabetic() || c == '_' => tokens.push(self.scan_identifier_or_keyword()),

                c => {
                    self.advance();
                    lexical_error(driver, &format!("Unexpected character '{c}'"), loc);
                }
            }
        }

        tokens
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn single(&mut self, token_type: TokenType) -> Token {
        let loc = self.location();
        self.advance();
        Token::new(token_type, loc)
    }

    /// Scans a one-character token which becomes a two-character token when followed by `next`.
    fn one_or_two(&mut self, next: char, one: TokenType, two: TokenType) -> Token {
        let loc = self.location();
        self.advance();

        if self.peek() == Some(next) {
            self.advance();
            Token::new(two, loc)
        } else {
            Token::new(one, loc)
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, driver: &mut Driver) {
        let loc = self.location();
        self.advance(); // '/'
        self.advance(); // '*'

        loop {
            match self.peek() {
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    lexical_error(driver, "Unterminated block comment", loc);
                    return;
                }
            }
        }
    }

    /// Scans a double-quoted string literal.
    ///
    /// Escape sequences are not evaluated; the literal is kept exactly as it appears in the
    /// source (including the quotes) so that later stages can carry it verbatim.
    fn scan_string_literal(&mut self, driver: &mut Driver) -> Option<Token> {
        let loc = self.location();
        let mut literal = String::new();

        literal.push(self.advance()?); // Opening quote

        loop {
            match self.peek() {
                Some('"') => {
                    literal.push(self.advance()?);
                    return Some(Token::new(TokenType::StringLiteral { literal }, loc));
                }
                Some('\\') => {
                    literal.push(self.advance()?);
                    if let Some(escaped) = self.advance() {
                        literal.push(escaped);
                    }
                }
                Some('\n') | None => {
                    lexical_error(driver, "Unterminated string literal", loc);
                    return None;
                }
                Some(_) => {
                    literal.push(self.advance()?);
                }
            }
        }
    }

    fn scan_numeric_literal(&mut self, driver: &mut Driver) -> Token {
        let loc = self.location();
        let mut literal = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // A dot followed by a digit makes this a float literal.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            literal.push('.');
            self.advance();

            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    literal.push(c);
                    self.advance();
                } else {
                    break;
                }
            }

            return Token::new(TokenType::FloatLiteral { literal }, loc);
        }

        match literal.parse::<i64>() {
            Ok(value) => Token::new(TokenType::IntegerLiteral { literal, value }, loc),
            Err(_) => {
                lexical_error(driver, &format!("Integer literal '{literal}' is out of range"), loc);
                Token::new(TokenType::IntegerLiteral { literal, value: 0 }, loc)
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let loc = self.location();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match Keyword::from_identifier(&text) {
            Some(keyword) => Token::new(TokenType::Keyword(keyword), loc),
            None => Token::new(TokenType::Identifier(text), loc),
        }
    }
}

fn lexical_error(driver: &mut Driver, message: &str, loc: SourceLocation) {
    driver.add_diagnostic(Diagnostic::error(ErrorKind::Lexical, message.to_string(), loc));
}
