//! Type Error Definitions
//!
//! This module defines all error types that can occur during type checking.

use crate::ast::{BinaryOp, Line, UnaryOp};
use crate::typeck::Ty;
use thiserror::Error;

/// A semantic diagnostic
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {kind}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub line: Line,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, line: Line) -> Self {
        Self { kind, line }
    }

    // ============ Error Constructors ============

    pub fn type_mismatch(expected: Ty, found: Ty, line: Line) -> Self {
        Self::new(TypeErrorKind::TypeMismatch { expected, found }, line)
    }

    pub fn undefined_name(name: &str, line: Line) -> Self {
        Self::new(TypeErrorKind::UndefinedName { name: name.to_string() }, line)
    }

    pub fn undefined_type(name: &str, line: Line) -> Self {
        Self::new(TypeErrorKind::UndefinedType { name: name.to_string() }, line)
    }

    pub fn not_a_value(name: &str, line: Line) -> Self {
        Self::new(TypeErrorKind::NotAValue { name: name.to_string() }, line)
    }

    pub fn not_callable(name: &str, line: Line) -> Self {
        Self::new(TypeErrorKind::NotCallable { name: name.to_string() }, line)
    }

    pub fn wrong_arg_count(name: &str, expected: usize, found: usize, line: Line) -> Self {
        Self::new(
            TypeErrorKind::WrongArgCount {
                name: name.to_string(),
                expected,
                found,
            },
            line,
        )
    }

    pub fn binary_op_mismatch(op: BinaryOp, left: Ty, right: Ty, line: Line) -> Self {
        Self::new(TypeErrorKind::BinaryOpMismatch { op, left, right }, line)
    }

    pub fn unary_op_mismatch(op: UnaryOp, ty: Ty, line: Line) -> Self {
        Self::new(TypeErrorKind::UnaryOpMismatch { op, ty }, line)
    }

    pub fn redefinition(name: &str, line: Line) -> Self {
        Self::new(TypeErrorKind::Redefinition { name: name.to_string() }, line)
    }

    pub fn condition_not_bool(ty: Ty, line: Line) -> Self {
        Self::new(TypeErrorKind::ConditionNotBool { ty }, line)
    }
}

/// The kind of type error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeErrorKind {
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: Ty, found: Ty },

    #[error("undefined name `{name}`")]
    UndefinedName { name: String },

    #[error("undefined type `{name}`")]
    UndefinedType { name: String },

    /// A type or function used where a value is expected
    #[error("`{name}` is not a value")]
    NotAValue { name: String },

    #[error("`{name}` is not callable")]
    NotCallable { name: String },

    #[error("wrong number of arguments to `{name}`: expected {expected}, found {found}")]
    WrongArgCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("unsupported operation: `{left}` {op} `{right}`")]
    BinaryOpMismatch { op: BinaryOp, left: Ty, right: Ty },

    #[error("unsupported operation: {op}`{ty}`")]
    UnaryOpMismatch { op: UnaryOp, ty: Ty },

    #[error("cannot assign to constant `{name}`")]
    AssignToConst { name: String },

    #[error("cannot assign to `{name}`")]
    NotAssignable { name: String },

    #[error("invalid assignment target")]
    InvalidAssignTarget,

    #[error("variable `{name}` needs a type or an initial value")]
    MissingTypeAndValue { name: String },

    #[error("`{name}` is already defined in this scope")]
    Redefinition { name: String },

    #[error("condition must be `bool`, found `{ty}`")]
    ConditionNotBool { ty: Ty },

    #[error("`break` outside of a loop")]
    BreakOutsideLoop,

    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,

    #[error("`return` outside of a function")]
    ReturnOutsideFunction,

    #[error("return type mismatch: expected `{expected}`, found `{found}`")]
    ReturnTypeMismatch { expected: Ty, found: Ty },

    #[error("function `{name}` cannot be declared inside another function")]
    NestedFunction { name: String },

    #[error("compound expression has no value")]
    CompoundWithoutValue,
}
