//! Token definitions for Wabbit
//!
//! This module defines all the tokens that the lexer can produce.
//! Line bookkeeping lives in the logos extras so every token knows the
//! 1-based line it started on.

use crate::ast::Line;
use crate::lexer::LexErrorKind;
use logos::{FilterResult, Logos};
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The exact source text of the token
    pub text: &'src str,
    /// 1-based source line
    pub line: Line,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, line: Line) -> Self {
        Self { kind, text, line }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "`{}`", self.text),
        }
    }
}

/// All possible token types in Wabbit
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(extras = Line)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // ============ Trivia ============

    /// Newlines and comments. Never emitted: the callbacks only advance the
    /// line counter and skip.
    #[token("\n", newline)]
    #[regex(r"//[^\n]*", logos::skip)]
    #[token("/*", block_comment)]
    Trivia,

    // ============ Literals ============

    /// Integer literal: 42
    #[regex(r"[0-9]+")]
    Integer,

    /// Float literal: 3.14, 3., .5
    #[regex(r"[0-9]+\.[0-9]*")]
    #[regex(r"\.[0-9]+")]
    Float,

    /// Character literal: 'a', '\n'
    #[token("'", char_literal)]
    Char,

    // ============ Keywords ============

    #[token("print")]
    Print,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("func")]
    Func,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // ============ Operators ============

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Divide,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("=")]
    Assign,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("&&")]
    LAnd,
    #[token("||")]
    LOr,
    #[token("!")]
    LNot,

    // ============ Punctuation ============

    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // ============ Identifiers ============

    /// Identifier: foo, _bar, int
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ============ Special ============

    /// End of file
    Eof,
}

fn newline(lex: &mut logos::Lexer<TokenKind>) -> logos::Skip {
    lex.extras += 1;
    logos::Skip
}

/// Skips to the matching `*/`, counting the newlines inside.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), LexErrorKind> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.extras += rest[..end].matches('\n').count() as Line;
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => FilterResult::Error(LexErrorKind::UnterminatedComment),
    }
}

/// Consumes up to the closing quote. A backslash always takes the next
/// character with it, so `'\''` closes on the second quote. Newlines taken
/// along this way still count towards the line.
fn char_literal(lex: &mut logos::Lexer<TokenKind>) -> Result<(), LexErrorKind> {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\'' => {
                lex.extras += rest[..i].matches('\n').count() as Line;
                lex.bump(i + 1);
                return Ok(());
            }
            _ => {}
        }
    }
    Err(LexErrorKind::UnterminatedChar)
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Trivia => "trivia",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::Char => "char",
            TokenKind::Print => "print",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Var => "var",
            TokenKind::Const => "const",
            TokenKind::Func => "func",
            TokenKind::While => "while",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Times => "*",
            TokenKind::Divide => "/",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Assign => "=",
            TokenKind::Eq => "==",
            TokenKind::Ne => "!=",
            TokenKind::LAnd => "&&",
            TokenKind::LOr => "||",
            TokenKind::LNot => "!",
            TokenKind::Semi => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Ident => "identifier",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
