//! Type Checker for Wabbit
//!
//! A single pre-order pass over the AST with a scope chain seeded with the
//! four primitive type names. Checking never stops at the first problem:
//! each failed sub-expression gets the type [`Ty::Error`] and the pass keeps
//! going, so one run reports every diagnostic it can find.
//!
//! # Rules in brief
//!
//! - No implicit conversions. Binary operands must have the same type.
//! - `int`/`float` support arithmetic and comparison, `bool` supports
//!   `&&`, `||`, `==`, `!=`, and `char` supports comparison only.
//! - `T(x)` where `T` is a primitive type is a conversion taking exactly one
//!   argument of any type.
//! - Functions can only be declared outside other functions. `break` and
//!   `continue` need a `while` within the same function.

mod context;
mod error;
mod ty;

pub use context::{FnSig, Symbol, TypeContext};
pub use error::{TypeError, TypeErrorKind};
pub use ty::Ty;

use crate::ast::*;

/// Main entry point for type checking a program
pub fn check_program(program: &Statements) -> Result<(), Vec<TypeError>> {
    let mut checker = TypeChecker::new();
    checker.check(program)
}

/// The type checker
pub struct TypeChecker {
    ctx: TypeContext,
    /// Collected errors
    errors: Vec<TypeError>,
}

impl TypeChecker {
    /// Create a new type checker
    pub fn new() -> Self {
        Self {
            ctx: TypeContext::new(),
            errors: Vec::new(),
        }
    }

    /// Check a complete program
    pub fn check(&mut self, program: &Statements) -> Result<(), Vec<TypeError>> {
        self.check_statements(program);
        tracing::debug!(diagnostics = self.errors.len(), "type checked program");
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Diagnostics collected so far
    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    fn error(&mut self, error: TypeError) {
        self.errors.push(error);
    }

    /// Run `f` in a fresh nested scope
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.ctx.enter_scope();
        let result = f(self);
        self.ctx.leave_scope();
        result
    }

    fn define(&mut self, name: &str, symbol: Symbol, line: Line) {
        if !self.ctx.define(name, symbol) {
            self.error(TypeError::redefinition(name, line));
        }
    }

    /// Resolve a type annotation through the scope chain
    fn resolve_type(&mut self, name: &str, line: Line) -> Ty {
        match self.ctx.lookup(name) {
            Some(Symbol::Type(ty)) => *ty,
            _ => {
                self.error(TypeError::undefined_type(name, line));
                Ty::Error
            }
        }
    }

    /// Report a mismatch unless either side has already failed
    fn expect_type(&mut self, expected: Ty, found: Ty, line: Line) {
        if expected != found && !expected.is_error() && !found.is_error() {
            self.error(TypeError::type_mismatch(expected, found, line));
        }
    }

    // ============ Statements ============

    /// Check a statement list in the current scope. Returns the type of the
    /// last statement if it produces a value.
    pub fn check_statements(&mut self, stmts: &Statements) -> Option<Ty> {
        let mut last = None;
        for stmt in &stmts.stmts {
            last = self.check_stmt(stmt);
        }
        last
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Option<Ty> {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::Const(decl) => {
                let value = self.check_expr(&decl.value);
                let ty = match &decl.ty {
                    Some(name) => {
                        let declared = self.resolve_type(name, line);
                        self.expect_type(declared, value, line);
                        declared
                    }
                    None => value,
                };
                self.define(&decl.name, Symbol::Const(ty), line);
            }

            StmtKind::Var(decl) => {
                let value = decl.value.as_ref().map(|e| self.check_expr(e));
                let ty = match (&decl.ty, value) {
                    (Some(name), value) => {
                        let declared = self.resolve_type(name, line);
                        if let Some(value) = value {
                            self.expect_type(declared, value, line);
                        }
                        declared
                    }
                    (None, Some(value)) => value,
                    (None, None) => {
                        self.error(TypeError::new(
                            TypeErrorKind::MissingTypeAndValue {
                                name: decl.name.clone(),
                            },
                            line,
                        ));
                        Ty::Error
                    }
                };
                self.define(&decl.name, Symbol::Var(ty), line);
            }

            StmtKind::Assign { target, value } => self.check_assign(target, value, line),

            StmtKind::Expr(expr) => return Some(self.check_expr(expr)),

            StmtKind::Print(expr) => {
                self.check_expr(expr);
            }

            StmtKind::If {
                test,
                consequence,
                alternative,
            } => {
                self.check_condition(test);
                self.scoped(|this| this.check_statements(consequence));
                if let Some(alternative) = alternative {
                    self.scoped(|this| this.check_statements(alternative));
                }
            }

            StmtKind::While { test, body } => {
                self.check_condition(test);
                self.scoped(|this| {
                    this.ctx.bind_loop();
                    this.check_statements(body)
                });
            }

            StmtKind::Break => {
                if !self.ctx.in_loop() {
                    self.error(TypeError::new(TypeErrorKind::BreakOutsideLoop, line));
                }
            }

            StmtKind::Continue => {
                if !self.ctx.in_loop() {
                    self.error(TypeError::new(TypeErrorKind::ContinueOutsideLoop, line));
                }
            }

            StmtKind::Function(decl) => self.check_function(decl, line),

            StmtKind::Return(expr) => {
                let found = self.check_expr(expr);
                match self.ctx.return_type() {
                    Some(expected) => {
                        if expected != found && !expected.is_error() && !found.is_error() {
                            self.error(TypeError::new(
                                TypeErrorKind::ReturnTypeMismatch { expected, found },
                                line,
                            ));
                        }
                    }
                    None => self.error(TypeError::new(TypeErrorKind::ReturnOutsideFunction, line)),
                }
            }
        }
        None
    }

    fn check_condition(&mut self, test: &Expr) {
        let ty = self.check_expr(test);
        if ty != Ty::Bool && !ty.is_error() {
            self.error(TypeError::condition_not_bool(ty, test.line));
        }
    }

    fn check_assign(&mut self, target: &Expr, value: &Expr, line: Line) {
        let found = self.check_expr(value);
        let ExprKind::Name(name) = &target.kind else {
            self.check_expr(target);
            self.error(TypeError::new(TypeErrorKind::InvalidAssignTarget, line));
            return;
        };

        match self.ctx.lookup(name) {
            Some(Symbol::Var(expected)) => {
                let expected = *expected;
                self.expect_type(expected, found, line);
            }
            Some(Symbol::Const(_)) => self.error(TypeError::new(
                TypeErrorKind::AssignToConst { name: name.clone() },
                line,
            )),
            Some(Symbol::Type(_)) | Some(Symbol::Func(_)) => self.error(TypeError::new(
                TypeErrorKind::NotAssignable { name: name.clone() },
                line,
            )),
            Some(Symbol::Loop) | Some(Symbol::Return(_)) | None => {
                self.error(TypeError::undefined_name(name, line))
            }
        }
    }

    fn check_function(&mut self, decl: &FnDecl, line: Line) {
        if self.ctx.in_function() {
            self.error(TypeError::new(
                TypeErrorKind::NestedFunction {
                    name: decl.name.clone(),
                },
                line,
            ));
        }

        let ret = self.resolve_type(&decl.return_type, line);
        let params: Vec<Ty> = decl
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty, p.line))
            .collect();

        // Bound before the body so the function can call itself
        self.define(
            &decl.name,
            Symbol::Func(FnSig {
                params: params.clone(),
                ret,
            }),
            line,
        );

        self.scoped(|this| {
            this.ctx.bind_return(ret);
            for (param, ty) in decl.params.iter().zip(params) {
                this.define(&param.name, Symbol::Var(ty), param.line);
            }
            this.check_statements(&decl.body);
        });
    }

    // ============ Expressions ============

    /// Type an expression, reporting any problems found inside it
    pub fn check_expr(&mut self, expr: &Expr) -> Ty {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Integer(_) => Ty::Int,
            ExprKind::Float(_) => Ty::Float,
            ExprKind::Character(_) => Ty::Char,
            ExprKind::Boolean(_) => Ty::Bool,

            ExprKind::Name(name) => match self.ctx.lookup(name) {
                Some(Symbol::Const(ty)) | Some(Symbol::Var(ty)) => *ty,
                Some(Symbol::Type(_)) | Some(Symbol::Func(_)) => {
                    self.error(TypeError::not_a_value(name, line));
                    Ty::Error
                }
                Some(Symbol::Loop) | Some(Symbol::Return(_)) | None => {
                    self.error(TypeError::undefined_name(name, line));
                    Ty::Error
                }
            },

            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                self.check_binary(*op, left, right, line)
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                let valid = match op {
                    UnaryOp::Pos | UnaryOp::Neg => ty.is_numeric(),
                    UnaryOp::Not => ty == Ty::Bool,
                };
                if valid || ty.is_error() {
                    ty
                } else {
                    self.error(TypeError::unary_op_mismatch(*op, ty, line));
                    Ty::Error
                }
            }

            ExprKind::Grouping(inner) => self.check_expr(inner),

            ExprKind::Compound(stmts) => match self.scoped(|this| this.check_statements(stmts)) {
                Some(ty) => ty,
                None => {
                    self.error(TypeError::new(TypeErrorKind::CompoundWithoutValue, line));
                    Ty::Error
                }
            },

            ExprKind::Call { callee, args } => self.check_call(callee, args, line),
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: Ty, right: Ty, line: Line) -> Ty {
        if left.is_error() || right.is_error() {
            return Ty::Error;
        }

        let valid = left == right
            && match left {
                Ty::Int | Ty::Float => !op.is_logical(),
                Ty::Bool => matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne),
                Ty::Char => op.is_comparison(),
                Ty::Error => false,
            };

        if !valid {
            self.error(TypeError::binary_op_mismatch(op, left, right, line));
            return Ty::Error;
        }

        if op.is_comparison() || op.is_logical() {
            Ty::Bool
        } else {
            left
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], line: Line) -> Ty {
        let arg_types: Vec<Ty> = args.iter().map(|arg| self.check_expr(arg)).collect();

        let ExprKind::Name(name) = &callee.kind else {
            self.check_expr(callee);
            self.error(TypeError::not_callable("expression", line));
            return Ty::Error;
        };

        match self.ctx.lookup(name).cloned() {
            // Conversion: the argument type is not checked
            Some(Symbol::Type(ty)) => {
                if arg_types.len() != 1 {
                    self.error(TypeError::wrong_arg_count(name, 1, arg_types.len(), line));
                }
                ty
            }
            Some(Symbol::Func(sig)) => {
                if sig.params.len() != arg_types.len() {
                    self.error(TypeError::wrong_arg_count(
                        name,
                        sig.params.len(),
                        arg_types.len(),
                        line,
                    ));
                } else {
                    for ((expected, found), arg) in sig.params.iter().zip(&arg_types).zip(args) {
                        self.expect_type(*expected, *found, arg.line);
                    }
                }
                sig.ret
            }
            Some(Symbol::Const(_)) | Some(Symbol::Var(_)) => {
                self.error(TypeError::not_callable(name, line));
                Ty::Error
            }
            Some(Symbol::Loop) | Some(Symbol::Return(_)) | None => {
                self.error(TypeError::undefined_name(name, line));
                Ty::Error
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn parse_ok(source: &str) -> Statements {
        let (program, errors) = parser::parse(source).expect("parse failed");
        assert!(errors.is_empty(), "Lex errors: {:?}", errors);
        program
    }

    fn check_ok(source: &str) {
        let program = parse_ok(source);
        if let Err(errors) = check_program(&program) {
            panic!("Type check failed: {:?}", errors);
        }
    }

    fn check_err(source: &str) -> Vec<TypeError> {
        let program = parse_ok(source);
        check_program(&program).expect_err("Expected type error")
    }

    fn kinds(source: &str) -> Vec<TypeErrorKind> {
        check_err(source).into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_var_initializer_mismatch() {
        let errors = check_err("var x int = 1.0;");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            TypeErrorKind::TypeMismatch {
                expected: Ty::Int,
                found: Ty::Float
            }
        );
        assert_eq!(errors[0].line, 1);
    }

    #[test]
    fn test_assign_to_const() {
        let errors = kinds("const y = 5; y = 6;");
        assert_eq!(errors, vec![TypeErrorKind::AssignToConst { name: "y".to_string() }]);
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(kinds("break;"), vec![TypeErrorKind::BreakOutsideLoop]);
        assert_eq!(kinds("continue;"), vec![TypeErrorKind::ContinueOutsideLoop]);
    }

    #[test]
    fn test_function_call_types_as_return_type() {
        let program = parse_ok("func f(a int, b int) int { return a + b; }\nf(1, 2);");
        let mut checker = TypeChecker::new();
        assert_eq!(checker.check_statements(&program), Some(Ty::Int));
        assert!(checker.errors().is_empty(), "{:?}", checker.errors());
    }

    #[test]
    fn test_declarations() {
        check_ok("const pi = 3.14159; var x int; var y = 'c'; var z bool = true;");
        assert_eq!(
            kinds("var x;"),
            vec![TypeErrorKind::MissingTypeAndValue { name: "x".to_string() }]
        );
        assert_eq!(
            kinds("var x string;"),
            vec![TypeErrorKind::UndefinedType { name: "string".to_string() }]
        );
    }

    #[test]
    fn test_redefinition_and_shadowing() {
        assert_eq!(
            kinds("var x = 1; var x = 2;"),
            vec![TypeErrorKind::Redefinition { name: "x".to_string() }]
        );
        check_ok("var x = 1; if true { var x = 2.0; print x; }");
        check_ok("var x = 1; while x < 2 { var x = 'a'; print x; break; }");
    }

    #[test]
    fn test_shadowing_a_type_name() {
        check_ok("if true { var int = 1; print int + 1; }");
        assert_eq!(
            kinds("var int = 1;"),
            vec![TypeErrorKind::Redefinition { name: "int".to_string() }]
        );
        assert_eq!(
            kinds("if true { var int = 1; var x int; }"),
            vec![TypeErrorKind::UndefinedType { name: "int".to_string() }]
        );
    }

    #[test]
    fn test_binary_operators() {
        check_ok("print 1 + 2; print 1.5 * 2.0; print 1 < 2; print 'a' < 'b';");
        check_ok("print true && false; print true == false; print 1.0 != 2.0;");
        assert_eq!(check_err("print 1 + 2.0;").len(), 1);
        assert_eq!(check_err("print 'a' + 'b';").len(), 1);
        assert_eq!(check_err("print true < false;").len(), 1);
        assert_eq!(check_err("print 1 && 2;").len(), 1);
    }

    #[test]
    fn test_unary_operators() {
        check_ok("print -1; print +2.5; print !true;");
        assert_eq!(check_err("print -'a';").len(), 1);
        assert_eq!(check_err("print !1;").len(), 1);
        assert_eq!(check_err("print -true;").len(), 1);
    }

    #[test]
    fn test_error_type_does_not_cascade() {
        // One root cause, one diagnostic
        let errors = check_err("var x int = (1 + 2.0) * 3;");
        assert_eq!(errors.len(), 1);
        let errors = check_err("print -(y + 1) < 2;");
        assert_eq!(errors, vec![TypeError::undefined_name("y", 1)]);
    }

    #[test]
    fn test_accumulates_independent_errors() {
        let errors = check_err("var x int = 1.0;\nprint undefined;\nbreak;");
        let lines: Vec<Line> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_conditions_must_be_bool() {
        assert_eq!(
            kinds("if 1 { print 1; }"),
            vec![TypeErrorKind::ConditionNotBool { ty: Ty::Int }]
        );
        assert_eq!(check_err("while 'a' { break; }").len(), 1);
    }

    #[test]
    fn test_both_if_branches_are_checked() {
        let errors = check_err("if true { print 1; } else { print 1 + 'a'; }");
        assert_eq!(errors.len(), 1);
        let errors = check_err("if true { print x; } else { print y; }");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_branch_scopes_do_not_leak() {
        let errors = check_err("if true { var t = 1; } print t;");
        assert_eq!(errors, vec![TypeError::undefined_name("t", 1)]);
    }

    #[test]
    fn test_assignment() {
        check_ok("var x = 1; x = x + 1;");
        assert_eq!(check_err("var x = 1; x = 2.0;").len(), 1);
        assert_eq!(
            kinds("func f() int { return 1; } f = 2;"),
            vec![TypeErrorKind::NotAssignable { name: "f".to_string() }]
        );
        assert_eq!(
            kinds("z = 1;"),
            vec![TypeErrorKind::UndefinedName { name: "z".to_string() }]
        );
    }

    #[test]
    fn test_names_that_are_not_values() {
        assert_eq!(
            kinds("print int;"),
            vec![TypeErrorKind::NotAValue { name: "int".to_string() }]
        );
        assert_eq!(check_err("func f() int { return 1; } print f;").len(), 1);
    }

    #[test]
    fn test_conversions() {
        check_ok("print int(2.5); print float(1); print char(65); print int(true); print bool(1);");
        assert_eq!(
            kinds("print int(1, 2);"),
            vec![TypeErrorKind::WrongArgCount {
                name: "int".to_string(),
                expected: 1,
                found: 2
            }]
        );
        let errors = check_err("var x float = int(2.5);");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_function_calls() {
        let source = "func f(a int, b float) float { return float(a) * b; }\n";
        check_ok(&format!("{}print f(1, 2.0);", source));
        assert_eq!(check_err(&format!("{}print f(1);", source)).len(), 1);
        assert_eq!(check_err(&format!("{}print f(1.0, 2.0);", source)).len(), 1);
        assert_eq!(
            kinds("var x = 1; print x(2);"),
            vec![TypeErrorKind::NotCallable { name: "x".to_string() }]
        );
        assert_eq!(check_err("print g();").len(), 1);
    }

    #[test]
    fn test_recursion() {
        check_ok("func fact(n int) int { if n < 2 { return 1; } return n * fact(n - 1); }");
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(kinds("return 1;"), vec![TypeErrorKind::ReturnOutsideFunction]);
        assert_eq!(
            kinds("func f() int { return 'a'; }"),
            vec![TypeErrorKind::ReturnTypeMismatch {
                expected: Ty::Int,
                found: Ty::Char
            }]
        );
    }

    #[test]
    fn test_nested_function_is_an_error() {
        let errors = kinds("func f() int { func g() int { return 1; } return g(); }");
        assert_eq!(errors, vec![TypeErrorKind::NestedFunction { name: "g".to_string() }]);
    }

    #[test]
    fn test_loop_marker_does_not_cross_function() {
        check_ok("while true { func f() int { return 1; } break; }");
        let errors = kinds("while true { func f() int { break; return 1; } }");
        assert_eq!(errors, vec![TypeErrorKind::BreakOutsideLoop]);
    }

    #[test]
    fn test_parameters() {
        check_ok("func f(x int) int { x = x + 1; return x; }");
        assert_eq!(
            kinds("func f(x int, x int) int { return x; }"),
            vec![TypeErrorKind::Redefinition { name: "x".to_string() }]
        );
        assert_eq!(
            kinds("func f(x text) int { return 1; }"),
            vec![TypeErrorKind::UndefinedType { name: "text".to_string() }]
        );
    }

    #[test]
    fn test_compound_expressions() {
        check_ok("var x = { var t = 2; t * t; }; print x;");
        assert_eq!(
            kinds("var x = { print 1; };"),
            vec![TypeErrorKind::CompoundWithoutValue]
        );
        assert_eq!(check_err("var y = { var t = 2; t; }; print t;").len(), 1);
    }
}
