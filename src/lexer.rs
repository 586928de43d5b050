//! Lexer for Wabbit
//!
//! The lexer converts source code into a lazy stream of tokens.
//! It uses the `logos` crate for efficient lexing.
//!
//! Illegal characters are recorded and skipped. An unterminated block
//! comment or character literal is fatal: the lexer yields the error once and
//! then ends.

use crate::ast::Line;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// What went wrong while lexing
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("illegal character")]
    IllegalChar,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("unterminated character constant")]
    UnterminatedChar,
}

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {kind} {text:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub text: String,
    pub line: Line,
}

impl LexError {
    /// Fatal errors stop tokenization
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, LexErrorKind::IllegalChar)
    }
}

/// The lexer for Wabbit
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    errors: Vec<LexError>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer_with_extras(source, 1),
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Take the non-fatal errors recorded so far
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Line the lexer is currently on
    pub fn line(&self) -> Line {
        self.inner.extras
    }

    /// Get the next token, `None` once the input is exhausted
    pub fn next_token(&mut self) -> Option<Result<Token<'src>, LexError>> {
        if self.finished {
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(kind)) => {
                    // A char literal can span an escaped newline; report where it starts
                    let text = self.inner.slice();
                    let line = self.inner.extras - text.matches('\n').count() as Line;
                    return Some(Ok(Token::new(kind, text, line)));
                }
                Some(Err(kind)) => {
                    let error = LexError {
                        kind,
                        text: self.inner.slice().to_string(),
                        line: self.inner.extras,
                    };
                    if error.is_fatal() {
                        self.finished = true;
                        return Some(Err(error));
                    }
                    // Skip invalid characters and record error
                    tracing::warn!(line = error.line, text = %error.text, "skipping illegal character");
                    self.errors.push(error);
                }
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a whole source text. Stops at the first fatal error; the second
/// element holds the non-fatal errors.
pub fn lex(source: &str) -> Result<(Vec<Token<'_>>, Vec<LexError>), LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token?);
    }
    tracing::debug!(tokens = tokens.len(), "lexed source");
    Ok((tokens, lexer.take_errors()))
}
