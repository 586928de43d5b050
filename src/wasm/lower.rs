//! AST to WebAssembly Lowering
//!
//! Converts a type-checked AST into a [`Module`]. Every expression pushes
//! exactly one value. Statement lists in block position drop whatever their
//! statements leave behind, so each structured block ends with an empty
//! stack; only a compound expression keeps the value of its last statement.
//!
//! Statements outside any function run in the synthesized `_init` function,
//! and the declarations they make become globals. `while` lowers to
//!
//! ```text
//! block $exitN
//!   loop $repeatN
//!     <test>
//!     i32.eqz
//!     br_if $exitN
//!     <body>
//!     br $repeatN
//!   end
//! end
//! ```

use std::mem;

use crate::ast::*;
use crate::scope::ScopeChain;
use crate::typeck::Ty;

use super::builder::{FunctionBuilder, NameAllocator, RETURN_LABEL};
use super::instr::Instr;
use super::types::{Global, Module, ValType};

/// Name of the synthesized top-level function
pub const INIT_FUNCTION: &str = "_init";

/// What a source name refers to during lowering
#[derive(Debug, Clone)]
enum Binding {
    Type(Ty),
    Global { name: String, ty: Ty },
    Local { name: String, ty: Ty },
    Func { name: String, ret: Ty },
}

/// Context for the current loop (used for break/continue)
#[derive(Debug, Clone)]
struct LoopContext {
    /// Label to branch to on `break`
    exit: String,
    /// Label to branch to on `continue`
    repeat: String,
}

/// Lowers AST to a WebAssembly module
pub struct Lowerer {
    module: Module,
    scopes: ScopeChain<Binding>,
    /// Function being emitted; `_init` outside any function body
    current: FunctionBuilder,
    in_function: bool,
    global_names: NameAllocator,
    function_names: NameAllocator,
    /// Stack of loop contexts for break/continue
    loop_stack: Vec<LoopContext>,
    loop_counter: u32,
    /// Emitted name of a global zero-parameter `main`
    main: Option<String>,
}

impl Lowerer {
    pub fn new() -> Self {
        let mut scopes = ScopeChain::new();
        for ty in Ty::PRIMITIVES {
            scopes.define(ty.name(), Binding::Type(ty));
        }

        let module = Module::new();
        let mut function_names = NameAllocator::new();
        for import in &module.imports {
            function_names.fresh(&import.name);
        }
        let init = function_names.fresh(INIT_FUNCTION);

        Self {
            module,
            scopes,
            current: FunctionBuilder::new(init, None),
            in_function: false,
            global_names: NameAllocator::new(),
            function_names,
            loop_stack: Vec::new(),
            loop_counter: 0,
            main: None,
        }
    }

    /// Lower a whole program
    pub fn lower(mut self, program: &Statements) -> Module {
        self.emit(Instr::Block(RETURN_LABEL.to_string()));
        self.lower_statements(program);
        if let Some(main) = self.main.take() {
            self.emit(Instr::Call(main));
            self.emit(Instr::Drop);
        }
        self.emit(Instr::End);

        let init = self.current.finish();
        self.module.functions.push(init);

        tracing::debug!(
            functions = self.module.functions.len(),
            globals = self.module.globals.len(),
            "lowered program"
        );
        self.module
    }

    fn emit(&mut self, instr: Instr) {
        self.current.emit(instr);
    }

    /// Run `f` in a fresh nested scope
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.enter_scope();
        let result = f(self);
        self.scopes.leave_scope();
        result
    }

    fn resolve_type(&self, name: &str) -> Ty {
        match self.scopes.lookup(name) {
            Some(Binding::Type(ty)) => *ty,
            _ => Ty::Error,
        }
    }

    // ============ Statements ============

    /// Statements in block position: nothing stays on the stack
    fn lower_statements(&mut self, stmts: &Statements) {
        for stmt in &stmts.stmts {
            if self.lower_stmt(stmt).is_some() {
                self.emit(Instr::Drop);
            }
        }
    }

    /// Lower one statement. Returns the type of the value it leaves on the
    /// stack, if any.
    fn lower_stmt(&mut self, stmt: &Stmt) -> Option<Ty> {
        match &stmt.kind {
            StmtKind::Const(decl) => {
                let ty = self.lower_expr(&decl.value);
                self.declare(&decl.name, ty);
            }

            StmtKind::Var(decl) => {
                let ty = match &decl.value {
                    Some(value) => self.lower_expr(value),
                    None => {
                        let ty = decl.ty.as_deref().map_or(Ty::Error, |t| self.resolve_type(t));
                        self.emit(Instr::zero(ValType::of(ty)));
                        ty
                    }
                };
                self.declare(&decl.name, ty);
            }

            StmtKind::Assign { target, value } => {
                self.lower_expr(value);
                if let ExprKind::Name(name) = &target.kind {
                    match self.scopes.lookup(name).cloned() {
                        Some(Binding::Global { name, .. }) => self.emit(Instr::GlobalSet(name)),
                        Some(Binding::Local { name, .. }) => self.emit(Instr::LocalSet(name)),
                        _ => self.emit(Instr::Drop),
                    }
                }
            }

            StmtKind::Expr(expr) => return Some(self.lower_expr(expr)),

            StmtKind::Print(expr) => {
                let ty = self.lower_expr(expr);
                let intrinsic = match ty {
                    Ty::Float => "_printf",
                    Ty::Bool => "_printb",
                    Ty::Char => "_printc",
                    Ty::Int | Ty::Error => "_printi",
                };
                self.emit(Instr::Call(intrinsic.to_string()));
            }

            StmtKind::If {
                test,
                consequence,
                alternative,
            } => {
                self.lower_expr(test);
                self.emit(Instr::If);
                self.scoped(|this| this.lower_statements(consequence));
                if let Some(alternative) = alternative {
                    self.emit(Instr::Else);
                    self.scoped(|this| this.lower_statements(alternative));
                }
                self.emit(Instr::End);
            }

            StmtKind::While { test, body } => self.lower_while(test, body),

            StmtKind::Break => {
                if let Some(ctx) = self.loop_stack.last() {
                    let label = ctx.exit.clone();
                    self.emit(Instr::Br(label));
                }
            }

            StmtKind::Continue => {
                if let Some(ctx) = self.loop_stack.last() {
                    let label = ctx.repeat.clone();
                    self.emit(Instr::Br(label));
                }
            }

            StmtKind::Function(decl) => self.lower_function(decl),

            StmtKind::Return(expr) => {
                self.lower_expr(expr);
                if self.current.has_result() {
                    self.emit(Instr::LocalSet(RETURN_LABEL.to_string()));
                } else {
                    self.emit(Instr::Drop);
                }
                self.emit(Instr::Br(RETURN_LABEL.to_string()));
            }
        }
        None
    }

    /// Allocate storage for a new name and store the value on the stack
    /// into it. Globals outside functions, locals inside.
    fn declare(&mut self, name: &str, ty: Ty) {
        let val_type = ValType::of(ty);
        let binding = if self.in_function {
            let emitted = self.current.add_local(name, val_type);
            self.emit(Instr::LocalSet(emitted.clone()));
            Binding::Local { name: emitted, ty }
        } else {
            let emitted = self.global_names.fresh(name);
            self.module.globals.push(Global {
                name: emitted.clone(),
                ty: val_type,
            });
            self.emit(Instr::GlobalSet(emitted.clone()));
            Binding::Global { name: emitted, ty }
        };
        self.scopes.define(name, binding);
    }

    fn lower_while(&mut self, test: &Expr, body: &Statements) {
        self.loop_counter += 1;
        let ctx = LoopContext {
            exit: format!("exit{}", self.loop_counter),
            repeat: format!("repeat{}", self.loop_counter),
        };

        self.emit(Instr::Block(ctx.exit.clone()));
        self.emit(Instr::Loop(ctx.repeat.clone()));
        self.lower_expr(test);
        self.emit(Instr::I32Eqz);
        self.emit(Instr::BrIf(ctx.exit.clone()));

        self.loop_stack.push(ctx.clone());
        self.scoped(|this| this.lower_statements(body));
        self.loop_stack.pop();

        self.emit(Instr::Br(ctx.repeat));
        self.emit(Instr::End);
        self.emit(Instr::End);
    }

    fn lower_function(&mut self, decl: &FnDecl) {
        let ret = self.resolve_type(&decl.return_type);
        let name = self.function_names.fresh(&decl.name);

        // Registered before the body so calls to it resolve, recursive ones included
        self.scopes.define(
            &decl.name,
            Binding::Func {
                name: name.clone(),
                ret,
            },
        );
        if self.scopes.is_global() && decl.name == "main" && decl.params.is_empty() {
            self.main = Some(name.clone());
        }

        let outer = mem::replace(
            &mut self.current,
            FunctionBuilder::new(name, Some(ValType::of(ret))),
        );
        let outer_loops = mem::take(&mut self.loop_stack);
        let outer_in_function = mem::replace(&mut self.in_function, true);

        self.scoped(|this| {
            for param in &decl.params {
                let ty = this.resolve_type(&param.ty);
                let emitted = this.current.add_param(&param.name, ValType::of(ty));
                this.scopes.define(&param.name, Binding::Local { name: emitted, ty });
            }
            this.emit(Instr::Block(RETURN_LABEL.to_string()));
            this.lower_statements(&decl.body);
            this.emit(Instr::End);
            this.emit(Instr::LocalGet(RETURN_LABEL.to_string()));
        });

        self.in_function = outer_in_function;
        self.loop_stack = outer_loops;
        let builder = mem::replace(&mut self.current, outer);
        tracing::trace!(function = builder.name(), "lowered function");
        self.module.functions.push(builder.finish());
    }

    // ============ Expressions ============

    /// Lower an expression, returning the source type of the pushed value
    fn lower_expr(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Integer(v) => {
                self.emit(Instr::I32Const(*v));
                Ty::Int
            }
            ExprKind::Float(v) => {
                self.emit(Instr::F64Const(*v));
                Ty::Float
            }
            ExprKind::Boolean(b) => {
                self.emit(Instr::I32Const(i32::from(*b)));
                Ty::Bool
            }
            ExprKind::Character(c) => {
                self.emit(Instr::I32Const(u32::from(*c) as i32));
                Ty::Char
            }

            ExprKind::Name(name) => match self.scopes.lookup(name).cloned() {
                Some(Binding::Global { name, ty }) => {
                    self.emit(Instr::GlobalGet(name));
                    ty
                }
                Some(Binding::Local { name, ty }) => {
                    self.emit(Instr::LocalGet(name));
                    ty
                }
                _ => {
                    self.emit(Instr::I32Const(0));
                    Ty::Error
                }
            },

            ExprKind::Binary { op, left, right } => {
                let ty = self.lower_expr(left);
                self.lower_expr(right);
                self.emit(binary_instr(*op, ValType::of(ty)));
                if op.is_comparison() || op.is_logical() {
                    Ty::Bool
                } else {
                    ty
                }
            }

            ExprKind::Unary { op, operand } => {
                let start = self.current.next_index();
                let ty = self.lower_expr(operand);
                match op {
                    UnaryOp::Pos => {}
                    UnaryOp::Neg => {
                        let val_type = ValType::of(ty);
                        self.current.insert(start, Instr::zero(val_type));
                        self.emit(match val_type {
                            ValType::F64 => Instr::F64Sub,
                            ValType::I32 => Instr::I32Sub,
                        });
                    }
                    UnaryOp::Not => {
                        self.emit(Instr::I32Const(1));
                        self.emit(Instr::I32Xor);
                    }
                }
                ty
            }

            ExprKind::Grouping(inner) => self.lower_expr(inner),

            ExprKind::Compound(stmts) => self.scoped(|this| {
                let mut last = None;
                for stmt in &stmts.stmts {
                    if last.is_some() {
                        this.emit(Instr::Drop);
                    }
                    last = this.lower_stmt(stmt);
                }
                last.unwrap_or(Ty::Error)
            }),

            ExprKind::Call { callee, args } => {
                let arg_types: Vec<Ty> = args.iter().map(|arg| self.lower_expr(arg)).collect();
                let ExprKind::Name(name) = &callee.kind else {
                    return Ty::Error;
                };
                match self.scopes.lookup(name).cloned() {
                    Some(Binding::Type(target)) => {
                        let from = arg_types.first().copied().map(ValType::of);
                        match (from, ValType::of(target)) {
                            (Some(ValType::F64), ValType::I32) => self.emit(Instr::I32TruncF64S),
                            (Some(ValType::I32), ValType::F64) => self.emit(Instr::F64ConvertI32S),
                            _ => {}
                        }
                        target
                    }
                    Some(Binding::Func { name, ret }) => {
                        self.emit(Instr::Call(name));
                        ret
                    }
                    _ => Ty::Error,
                }
            }
        }
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}

/// The instruction for a binary operator on operands of type `ty`
fn binary_instr(op: BinaryOp, ty: ValType) -> Instr {
    match (ty, op) {
        (ValType::F64, BinaryOp::Add) => Instr::F64Add,
        (ValType::F64, BinaryOp::Sub) => Instr::F64Sub,
        (ValType::F64, BinaryOp::Mul) => Instr::F64Mul,
        (ValType::F64, BinaryOp::Div) => Instr::F64Div,
        (ValType::F64, BinaryOp::Lt) => Instr::F64Lt,
        (ValType::F64, BinaryOp::Le) => Instr::F64Le,
        (ValType::F64, BinaryOp::Gt) => Instr::F64Gt,
        (ValType::F64, BinaryOp::Ge) => Instr::F64Ge,
        (ValType::F64, BinaryOp::Eq) => Instr::F64Eq,
        (ValType::F64, BinaryOp::Ne) => Instr::F64Ne,
        (_, BinaryOp::Add) => Instr::I32Add,
        (_, BinaryOp::Sub) => Instr::I32Sub,
        (_, BinaryOp::Mul) => Instr::I32Mul,
        (_, BinaryOp::Div) => Instr::I32DivS,
        (_, BinaryOp::Lt) => Instr::I32LtS,
        (_, BinaryOp::Le) => Instr::I32LeS,
        (_, BinaryOp::Gt) => Instr::I32GtS,
        (_, BinaryOp::Ge) => Instr::I32GeS,
        (_, BinaryOp::Eq) => Instr::I32Eq,
        (_, BinaryOp::Ne) => Instr::I32Ne,
        // Both sides are always evaluated
        (_, BinaryOp::And) => Instr::I32And,
        (_, BinaryOp::Or) => Instr::I32Or,
    }
}

/// Lower a type-checked program
pub fn lower_program(program: &Statements) -> Module {
    Lowerer::new().lower(program)
}
