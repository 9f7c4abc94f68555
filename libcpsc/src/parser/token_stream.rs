// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `token_stream` module provides a stateful [TokenStream] which allows the parser to
//! consume and peek at tokens in the stream.

use crate::core::SourceLocation;
use crate::lexer::{Keyword, Token, TokenType};

/// A token stream is a list of tokens produced by the lexer which can be iterated over.
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    /// Creates a new token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    /// Returns the next token in the stream and advances, or None if at the end of the stream.
    pub fn take_token(&mut self) -> Option<&Token> {
        if self.cursor >= self.tokens.len() {
            return None;
        }
        let token = Some(&self.tokens[self.cursor]);
        self.cursor += 1;
        token
    }

    /// Peeks at the next token in the stream and, if it has the expected type, returns the token
    /// and advances.
    pub fn take_token_if_expected(&mut self, expected_type: &TokenType) -> Option<&Token> {
        if self.next_token_has_type(expected_type) { self.take_token() } else { None }
    }

    /// Peeks at the next token in the stream without advancing past it.
    pub fn peek_next_token(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Peeks at the token after the next one without advancing.
    pub fn peek_second_token(&self) -> Option<&Token> {
        self.tokens.get(self.cursor + 1)
    }

    /// Peeks at the next token in the stream and returns whether its type matches the given type.
    ///
    /// Returns false if the stream has no more tokens.
    pub fn next_token_has_type(&self, token_type: &TokenType) -> bool {
        matches!(self.peek_next_token(), Some(token) if token.token_type == *token_type)
    }

    /// Peeks at the next token and returns whether it is the given keyword.
    pub fn next_token_is_keyword(&self, keyword: Keyword) -> bool {
        self.next_token_has_type(&TokenType::Keyword(keyword))
    }

    /// Is the stream exhausted?
    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// The source location of the next token, or of the end of the stream.
    pub fn next_location(&self) -> SourceLocation {
        match self.peek_next_token() {
            Some(token) => token.loc,
            None => self.tokens.last().map(|t| t.loc).unwrap_or_default(),
        }
    }
}
