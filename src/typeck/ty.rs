//! Type representation for Wabbit
//!
//! Wabbit has four primitive types and no way to build new ones. `Error` is
//! the type of any expression that failed to check; it lets checking continue
//! without piling a second diagnostic onto the same node.

use std::fmt;

/// A resolved type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Float,
    Char,
    Bool,
    /// Result of a failed sub-check
    Error,
}

impl Ty {
    /// The primitive types, bound by name in the global scope
    pub const PRIMITIVES: [Ty; 4] = [Ty::Int, Ty::Float, Ty::Char, Ty::Bool];

    pub fn name(&self) -> &'static str {
        match self {
            Ty::Int => "int",
            Ty::Float => "float",
            Ty::Char => "char",
            Ty::Bool => "bool",
            Ty::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    /// `int` or `float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names() {
        let names: Vec<String> = Ty::PRIMITIVES.iter().map(|ty| ty.to_string()).collect();
        assert_eq!(names, vec!["int", "float", "char", "bool"]);
        assert!(Ty::PRIMITIVES.iter().all(|ty| !ty.is_error()));
        assert_eq!(Ty::Error.to_string(), "error");
    }
}
