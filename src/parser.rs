//! Parser for Wabbit
//!
//! This is a recursive descent parser with one token of lookahead that turns
//! the token stream into an AST. Expression precedence, from tightest to
//! loosest: unary, multiplicative, additive, relational, `&&`, `||`.
//!
//! The relational level takes at most one operator, so `a < b < c` leaves the
//! second `<` unconsumed and the statement fails to find its `;`.

use crate::ast::*;
use crate::lexer::{LexError, Lexer};
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: Line,
    },

    #[error("line {line}: {message}")]
    Custom { message: String, line: Line },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn line(&self) -> Line {
        match self {
            ParseError::UnexpectedToken { line, .. } => *line,
            ParseError::Custom { line, .. } => *line,
            ParseError::Lex(e) => e.line,
        }
    }
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

const RELATIONAL: [(TokenKind, BinaryOp); 6] = [
    (TokenKind::Lt, BinaryOp::Lt),
    (TokenKind::Le, BinaryOp::Le),
    (TokenKind::Gt, BinaryOp::Gt),
    (TokenKind::Ge, BinaryOp::Ge),
    (TokenKind::Eq, BinaryOp::Eq),
    (TokenKind::Ne, BinaryOp::Ne),
];
const ADDITIVE: [(TokenKind, BinaryOp); 2] =
    [(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)];
const MULTIPLICATIVE: [(TokenKind, BinaryOp); 2] =
    [(TokenKind::Times, BinaryOp::Mul), (TokenKind::Divide, BinaryOp::Div)];

/// The parser for Wabbit
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Token<'src>>,
}

impl<'src> Parser<'src> {
    /// Create a new parser
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
        }
    }

    // ============ Token primitives ============

    /// The lookahead token, pulled from the lexer on demand
    fn current(&mut self) -> ParseResult<Token<'src>> {
        if let Some(token) = self.lookahead {
            return Ok(token);
        }
        let token = match self.lexer.next_token() {
            Some(token) => token?,
            None => Token::new(TokenKind::Eof, "", self.lexer.line()),
        };
        self.lookahead = Some(token);
        Ok(token)
    }

    fn advance(&mut self) {
        self.lookahead = None;
    }

    /// Return the lookahead if it is one of `kinds`, without consuming it
    fn peek(&mut self, kinds: &[TokenKind]) -> ParseResult<Option<Token<'src>>> {
        let token = self.current()?;
        Ok(kinds.contains(&token.kind).then_some(token))
    }

    /// Consume the lookahead if it is one of `kinds`
    fn accept(&mut self, kinds: &[TokenKind]) -> ParseResult<Option<Token<'src>>> {
        let token = self.peek(kinds)?;
        if token.is_some() {
            self.advance();
        }
        Ok(token)
    }

    /// Consume the lookahead if it is one of `kinds`, otherwise error
    fn expect(&mut self, kinds: &[TokenKind]) -> ParseResult<Token<'src>> {
        match self.accept(kinds)? {
            Some(token) => Ok(token),
            None => Err(self.unexpected(&describe_kinds(kinds))?),
        }
    }

    fn unexpected(&mut self, expected: &str) -> ParseResult<ParseError> {
        let token = self.current()?;
        Ok(ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.to_string(),
            line: token.line,
        })
    }

    // ============ Statements ============

    /// Parse a complete program
    pub fn parse_program(&mut self) -> ParseResult<Statements> {
        let program = self.parse_statements()?;
        self.expect(&[TokenKind::Eof])?;
        Ok(program)
    }

    /// Statements up to a closing brace or the end of input
    fn parse_statements(&mut self) -> ParseResult<Statements> {
        let line = self.current()?.line;
        let mut stmts = Vec::new();
        while self.peek(&[TokenKind::RBrace, TokenKind::Eof])?.is_none() {
            stmts.push(self.parse_statement()?);
        }
        Ok(Statements::new(stmts, line))
    }

    fn parse_block(&mut self) -> ParseResult<Statements> {
        self.expect(&[TokenKind::LBrace])?;
        let stmts = self.parse_statements()?;
        self.expect(&[TokenKind::RBrace])?;
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current()?.kind {
            TokenKind::Print => self.parse_print(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Var => self.parse_var(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => self.parse_jump(TokenKind::Break, StmtKind::Break),
            TokenKind::Continue => self.parse_jump(TokenKind::Continue, StmtKind::Continue),
            TokenKind::Func => self.parse_func(),
            _ => self.parse_assignment_or_expr(),
        }
    }

    fn parse_print(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::Print])?.line;
        let value = self.parse_expr()?;
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(StmtKind::Print(value), line))
    }

    fn parse_const(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::Const])?.line;
        let name = self.expect(&[TokenKind::Ident])?.text.to_string();
        let ty = self.accept(&[TokenKind::Ident])?.map(|t| t.text.to_string());
        self.expect(&[TokenKind::Assign])?;
        let value = self.parse_expr()?;
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(StmtKind::Const(ConstDecl { name, ty, value }), line))
    }

    fn parse_var(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::Var])?.line;
        let name = self.expect(&[TokenKind::Ident])?.text.to_string();
        let ty = self.accept(&[TokenKind::Ident])?.map(|t| t.text.to_string());
        let value = if self.accept(&[TokenKind::Assign])?.is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(StmtKind::Var(VarDecl { name, ty, value }), line))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::Return])?.line;
        let value = self.parse_expr()?;
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(StmtKind::Return(value), line))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::If])?.line;
        let test = self.parse_expr()?;
        let consequence = self.parse_block()?;
        let alternative = if self.accept(&[TokenKind::Else])?.is_some() {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                test,
                consequence,
                alternative,
            },
            line,
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::While])?.line;
        let test = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::While { test, body }, line))
    }

    /// `break;` and `continue;`
    fn parse_jump(&mut self, keyword: TokenKind, kind: StmtKind) -> ParseResult<Stmt> {
        let line = self.expect(&[keyword])?.line;
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(kind, line))
    }

    fn parse_func(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&[TokenKind::Func])?.line;
        let name = self.expect(&[TokenKind::Ident])?.text.to_string();

        self.expect(&[TokenKind::LParen])?;
        let mut params = Vec::new();
        while self.peek(&[TokenKind::RParen])?.is_none() {
            let param_name = self.expect(&[TokenKind::Ident])?;
            let param_ty = self.expect(&[TokenKind::Ident])?;
            params.push(Param {
                name: param_name.text.to_string(),
                ty: param_ty.text.to_string(),
                line: param_name.line,
            });
            if self.peek(&[TokenKind::RParen])?.is_none() {
                self.expect(&[TokenKind::Comma])?;
            }
        }
        self.expect(&[TokenKind::RParen])?;

        let return_type = self.expect(&[TokenKind::Ident])?.text.to_string();
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::Function(FnDecl {
                name,
                params,
                return_type,
                body,
            }),
            line,
        ))
    }

    /// Parse a full expression, then decide on assignment by the next token
    fn parse_assignment_or_expr(&mut self) -> ParseResult<Stmt> {
        let target = self.parse_expr()?;
        let line = target.line;
        if self.accept(&[TokenKind::Assign])?.is_some() {
            let value = self.parse_expr()?;
            self.expect(&[TokenKind::Semi])?;
            return Ok(Stmt::new(StmtKind::Assign { target, value }, line));
        }
        self.expect(&[TokenKind::Semi])?;
        Ok(Stmt::new(StmtKind::Expr(target), line))
    }

    // ============ Expressions ============

    /// Parse a single expression
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;
        while let Some(token) = self.accept(&[TokenKind::LOr])? {
            let right = self.parse_and()?;
            expr = binary(BinaryOp::Or, expr, right, token.line);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_relational()?;
        while let Some(token) = self.accept(&[TokenKind::LAnd])? {
            let right = self.parse_relational()?;
            expr = binary(BinaryOp::And, expr, right, token.line);
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_additive()?;
        if let Some((op, line)) = self.accept_op(&RELATIONAL)? {
            let right = self.parse_additive()?;
            return Ok(binary(op, expr, right, line));
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        while let Some((op, line)) = self.accept_op(&ADDITIVE)? {
            let right = self.parse_multiplicative()?;
            expr = binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_factor()?;
        while let Some((op, line)) = self.accept_op(&MULTIPLICATIVE)? {
            let right = self.parse_factor()?;
            expr = binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn accept_op(&mut self, table: &[(TokenKind, BinaryOp)]) -> ParseResult<Option<(BinaryOp, Line)>> {
        let token = self.current()?;
        match table.iter().find(|(kind, _)| *kind == token.kind) {
            Some(&(_, op)) => {
                self.advance();
                Ok(Some((op, token.line)))
            }
            None => Ok(None),
        }
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let token = self.current()?;
        let line = token.line;

        let kind = match token.kind {
            TokenKind::Integer => {
                self.advance();
                ExprKind::Integer(parse_int(token.text, line)?)
            }
            TokenKind::Float => {
                self.advance();
                ExprKind::Float(parse_float(token.text, line)?)
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                ExprKind::Boolean(token.kind == TokenKind::True)
            }
            TokenKind::Char => {
                self.advance();
                ExprKind::Character(parse_char(token.text, line)?)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&[TokenKind::RParen])?;
                let inner_line = inner.line;
                return Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), inner_line));
            }
            TokenKind::LBrace => {
                self.advance();
                let stmts = self.parse_statements()?;
                self.expect(&[TokenKind::RBrace])?;
                ExprKind::Compound(stmts)
            }
            TokenKind::Plus | TokenKind::Minus | TokenKind::LNot => {
                self.advance();
                let op = match token.kind {
                    TokenKind::Plus => UnaryOp::Pos,
                    TokenKind::Minus => UnaryOp::Neg,
                    _ => UnaryOp::Not,
                };
                let operand = self.parse_factor()?;
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                }
            }
            TokenKind::Ident => {
                self.advance();
                let name = Expr::new(ExprKind::Name(token.text.to_string()), line);
                if self.accept(&[TokenKind::LParen])?.is_none() {
                    return Ok(name);
                }
                let args = self.parse_args()?;
                self.expect(&[TokenKind::RParen])?;
                ExprKind::Call {
                    callee: Box::new(name),
                    args,
                }
            }
            _ => return Err(self.unexpected("expression")?),
        };

        Ok(Expr::new(kind, line))
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        while self.peek(&[TokenKind::RParen])?.is_none() {
            args.push(self.parse_expr()?);
            if self.peek(&[TokenKind::RParen])?.is_none() {
                self.expect(&[TokenKind::Comma])?;
            }
        }
        Ok(args)
    }
}

// ============ Helper functions ============

fn binary(op: BinaryOp, left: Expr, right: Expr, line: Line) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}

fn describe_kinds(kinds: &[TokenKind]) -> String {
    kinds
        .iter()
        .map(|kind| match kind {
            TokenKind::Ident
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Char
            | TokenKind::Eof => kind.to_string(),
            _ => format!("`{}`", kind),
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Literals above `i32::MAX` wrap, as the target reads `i32.const`.
fn parse_int(text: &str, line: Line) -> ParseResult<i32> {
    text.parse::<u32>()
        .map(|v| v as i32)
        .map_err(|_| ParseError::Custom {
            message: format!("integer literal {} out of range", text),
            line,
        })
}

fn parse_float(text: &str, line: Line) -> ParseResult<f64> {
    text.parse::<f64>().map_err(|_| ParseError::Custom {
        message: format!("malformed float literal {}", text),
        line,
    })
}

fn parse_char(text: &str, line: Line) -> ParseResult<char> {
    let malformed = || ParseError::Custom {
        message: format!("malformed character literal {}", text),
        line,
    };

    let inner = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(malformed)?;
    let mut chars = inner.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(escaped), None) => Ok(match escaped {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            // \\, \' and \" as well as unknown escapes: the character itself
            c => c,
        }),
        (Some(c), None, None) if c != '\\' => Ok(c),
        _ => Err(malformed()),
    }
}

/// Parse source code into an AST. The second element holds the non-fatal
/// lexer errors met on the way.
pub fn parse(source: &str) -> ParseResult<(Statements, Vec<LexError>)> {
    let (program, lex_errors) = parse_with_lex_errors(source);
    Ok((program?, lex_errors))
}

/// Like [`parse`], but the non-fatal lexer errors are returned even when
/// parsing fails. Those met before the syntax error are all there.
pub fn parse_with_lex_errors(source: &str) -> (ParseResult<Statements>, Vec<LexError>) {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    if let Ok(program) = &program {
        tracing::debug!(statements = program.len(), "parsed program");
    }
    (program, parser.lexer.take_errors())
}
