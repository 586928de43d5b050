//! Lexical scope chain
//!
//! An ordered stack of name maps, innermost last. Both the type checker and the
//! code generator own one of these; they never share an instance.

use std::collections::HashMap;

/// A single scope level
#[derive(Debug, Clone)]
pub struct Scope<V> {
    symbols: HashMap<String, V>,
}

impl<V> Scope<V> {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of scopes. The outermost (global) scope is never popped.
#[derive(Debug, Clone)]
pub struct ScopeChain<V> {
    scopes: Vec<Scope<V>>,
}

impl<V> ScopeChain<V> {
    /// Create a chain holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Leave the current scope
    /// Note: Will not pop the global scope (keeps at least one scope)
    pub fn leave_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Whether only the global scope is live
    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Bind `name` in the innermost scope. Returns the previous binding from
    /// that same scope, if any; outer bindings are shadowed, not replaced.
    pub fn define(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let depth = self.scopes.len();
        self.scopes[depth - 1].symbols.insert(name.into(), value)
    }

    /// Whether `name` is already bound in the innermost scope
    pub fn defined_locally(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }

    /// Look up a name, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look up a name, innermost first, without searching past the first
    /// scope that binds `barrier`. The barrier scope itself is searched.
    pub fn lookup_within(&self, name: &str, barrier: &str) -> Option<&V> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value);
            }
            if scope.contains(barrier) {
                return None;
            }
        }
        None
    }
}

impl<V> Default for ScopeChain<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_innermost_first() {
        let mut chain = ScopeChain::new();
        chain.define("x", 1);
        chain.enter_scope();
        chain.define("x", 2);
        assert_eq!(chain.lookup("x"), Some(&2));
        chain.leave_scope();
        assert_eq!(chain.lookup("x"), Some(&1));
    }

    #[test]
    fn test_defined_locally_ignores_outer_scopes() {
        let mut chain = ScopeChain::new();
        chain.define("x", ());
        chain.enter_scope();
        assert!(!chain.defined_locally("x"));
        assert!(chain.lookup("x").is_some());
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut chain: ScopeChain<i32> = ScopeChain::new();
        chain.define("x", 1);
        chain.leave_scope();
        chain.leave_scope();
        assert!(chain.is_global());
        assert_eq!(chain.lookup("x"), Some(&1));
        chain.enter_scope();
        assert!(!chain.is_global());
    }

    #[test]
    fn test_lookup_stops_at_barrier() {
        let mut chain = ScopeChain::new();
        chain.enter_scope();
        chain.define("loop", 1);
        chain.enter_scope();
        chain.define("fn", 2);
        chain.enter_scope();
        assert_eq!(chain.lookup_within("loop", "fn"), None);
        assert_eq!(chain.lookup_within("fn", "fn"), Some(&2));
        assert_eq!(chain.lookup("loop"), Some(&1));
    }
}
