//! Type checking context
//!
//! Symbol tables over a [`ScopeChain`]. Loop and function markers are stored
//! under the keywords `while` and `return`, which can never be identifiers.

use super::Ty;
use crate::scope::ScopeChain;

const LOOP_MARKER: &str = "while";
const RETURN_MARKER: &str = "return";

/// A function signature
#[derive(Debug, Clone, PartialEq)]
pub struct FnSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

/// What a name is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A type name
    Type(Ty),
    Const(Ty),
    Var(Ty),
    Func(FnSig),
    /// Marks the body scope of a `while`
    Loop,
    /// Marks a function scope, holding its declared return type
    Return(Ty),
}

/// Scoped symbol tables for the type checker
#[derive(Debug)]
pub struct TypeContext {
    scopes: ScopeChain<Symbol>,
}

impl TypeContext {
    /// Create a context with the primitive types bound globally
    pub fn new() -> Self {
        let mut scopes = ScopeChain::new();
        for ty in Ty::PRIMITIVES {
            scopes.define(ty.name(), Symbol::Type(ty));
        }
        Self { scopes }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.enter_scope();
    }

    pub fn leave_scope(&mut self) {
        self.scopes.leave_scope();
    }

    /// Bind a name in the innermost scope. Returns `false`, leaving the
    /// existing binding alone, if the name is already bound there.
    pub fn define(&mut self, name: &str, symbol: Symbol) -> bool {
        if self.scopes.defined_locally(name) {
            return false;
        }
        self.scopes.define(name, symbol);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(name)
    }

    /// Mark the innermost scope as a loop body
    pub fn bind_loop(&mut self) {
        self.scopes.define(LOOP_MARKER, Symbol::Loop);
    }

    /// Whether `break`/`continue` have a target. The search does not leave
    /// the enclosing function.
    pub fn in_loop(&self) -> bool {
        self.scopes.lookup_within(LOOP_MARKER, RETURN_MARKER).is_some()
    }

    /// Mark the innermost scope as a function body returning `ty`
    pub fn bind_return(&mut self, ty: Ty) {
        self.scopes.define(RETURN_MARKER, Symbol::Return(ty));
    }

    /// Declared return type of the enclosing function
    pub fn return_type(&self) -> Option<Ty> {
        match self.scopes.lookup(RETURN_MARKER) {
            Some(Symbol::Return(ty)) => Some(*ty),
            _ => None,
        }
    }

    pub fn in_function(&self) -> bool {
        self.return_type().is_some()
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}
