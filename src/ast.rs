//! Abstract Syntax Tree (AST) for Wabbit
//!
//! The AST represents the structure of a Wabbit program after parsing.
//! Nodes are built once by the parser and only read afterwards. Each node
//! carries the source line it came from.

use std::fmt;

/// 1-based source line
pub type Line = u32;

/// An ordered sequence of statements: a whole program, a function body, a
/// branch, a loop body or the inside of a compound expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Statements {
    pub stmts: Vec<Stmt>,
    pub line: Line,
}

impl Statements {
    pub fn new(stmts: Vec<Stmt>, line: Line) -> Self {
        Self { stmts, line }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }
}

// ============ Statements ============

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: Line,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: Line) -> Self {
        Self { kind, line }
    }
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `const name [type] = value;`
    Const(ConstDecl),

    /// `var name [type] [= value];`
    Var(VarDecl),

    /// `location = value;`
    Assign { target: Expr, value: Expr },

    /// `expr;`
    Expr(Expr),

    /// `print expr;`
    Print(Expr),

    /// `if test { ... } [else { ... }]`
    If {
        test: Expr,
        consequence: Statements,
        alternative: Option<Statements>,
    },

    /// `while test { ... }`
    While { test: Expr, body: Statements },

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `func name(params) type { ... }`
    Function(FnDecl),

    /// `return expr;`
    Return(Expr),
}

/// Constant declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    /// Optional type annotation (a type name)
    pub ty: Option<String>,
    pub value: Expr,
}

/// Variable declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<String>,
    pub value: Option<Expr>,
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: String,
    pub body: Statements,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: String,
    pub line: Line,
}

// ============ Expressions ============

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: Line,
}

impl Expr {
    pub fn new(kind: ExprKind, line: Line) -> Self {
        Self { kind, line }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal: 42
    Integer(i32),

    /// Float literal: 3.14
    Float(f64),

    /// Boolean literal: true, false
    Boolean(bool),

    /// Character literal: 'a'
    Character(char),

    /// Identifier reference: x
    Name(String),

    /// Binary operation: a + b
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: -x, !b
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Parenthesized expression: (e)
    Grouping(Box<Expr>),

    /// Block used as a value: `{ var t = 2; t * t; }`, valued by its last statement
    Compound(Statements),

    /// Function application or conversion: f(a, b), float(x)
    Call { callee: Box<Expr>, args: Vec<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Comparison operators produce `bool`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", s)
    }
}
